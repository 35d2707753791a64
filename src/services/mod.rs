pub mod jwt;
pub mod notification;

pub use jwt::JwtService;
pub use notification::NotificationService;
