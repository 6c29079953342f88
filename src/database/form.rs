use std::str::FromStr;

use super::error::TypeError;

/// Raw query-string pairs. Keys may repeat (`?tags=lunch&tags=dinner`).
pub type FormData = Vec<(String, String)>;

pub struct Form {
    inner: FormData,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.inner
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_e| TypeError::new(&format!("Invalid number for '{key}'"))),
            None => Ok(None),
        }
    }

    /// `1`/`true` and `0`/`false`; a missing key is `false`.
    pub fn get_flag(&self, key: &str) -> Result<bool, TypeError> {
        match self.get_str(key) {
            Some("1") | Some("true") => Ok(true),
            Some("0") | Some("false") | None => Ok(false),
            Some(_) => Err(TypeError::new(&format!("Invalid flag for '{key}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form::from_data(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn repeated_keys_are_collected() {
        let form = form(&[("tags", "lunch"), ("page", "2"), ("tags", "dinner")]);

        assert_eq!(form.get_all("tags"), vec!["lunch", "dinner"]);
        assert_eq!(form.get_str("tags"), Some("lunch"));
    }

    #[test]
    fn numbers_parse_or_fail() {
        let form = form(&[("page", "3"), ("limit", "many")]);

        assert_eq!(form.get_number::<i64>("page").unwrap(), Some(3));
        assert_eq!(form.get_number::<i64>("author").unwrap(), None);
        assert!(form.get_number::<i64>("limit").is_err());
    }

    #[test]
    fn flags() {
        let form = form(&[("is_favorited", "1"), ("is_in_shopping_cart", "0"), ("x", "yes")]);

        assert!(form.get_flag("is_favorited").unwrap());
        assert!(!form.get_flag("is_in_shopping_cart").unwrap());
        assert!(!form.get_flag("missing").unwrap());
        assert!(form.get_flag("x").is_err());
    }
}
