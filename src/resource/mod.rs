pub mod image;
pub mod login;
pub mod register;
pub mod users;

pub use image::{get_image, set_image};
pub use login::login;
pub use register::register;
pub use users::{get_user, list_users};
