//! UI Builder module for creating keyboards

use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup, WebAppInfo};

/// Reply keyboard with a single button that opens the order mini-application
pub fn create_order_keyboard(button_text: String, web_app_url: reqwest::Url) -> KeyboardMarkup {
    let button = KeyboardButton::new(button_text).request(ButtonRequest::WebApp(WebAppInfo {
        url: web_app_url,
    }));

    KeyboardMarkup::new(vec![vec![button]]).resize_keyboard()
}
