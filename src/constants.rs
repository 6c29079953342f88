pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 5000;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 10_000;
pub const FIELD_MAX_LENGTH: usize = 255;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const USER_FIELD_MAX_LENGTH: usize = 150;

pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const DEFAULT_PORT: u16 = 8000;
pub const SESSION_LIFETIME_HOURS: i64 = 24;
pub const DATABASE_MAX_CONNECTIONS: u32 = 10;
pub const BODY_SIZE_LIMIT: u64 = 16 * 1024 * 1024;

pub const SHOPPING_LIST_FILENAME: &str = "shop_list.txt";

/// Characters allowed in usernames besides letters and digits.
pub const USERNAME_EXTRA_CHARS: &[char] = &['.', '@', '+', '-', '_'];
