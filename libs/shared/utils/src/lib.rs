pub mod extractor;
pub mod flash;
pub mod forms;
pub mod html;
pub mod pages;
pub mod params;
pub mod test_utils;

pub use extractor::JsonBody;
pub use flash::{set_flash, take_flash, Flash, FlashLevel};
pub use forms::FormInput;
pub use html::HtmlError;
pub use pages::{confirm_delete, delete_redirect, form_page, redirect_with, saved, Saved};
