pub mod auth;
pub mod drive;
pub mod oauth;

pub use auth::{Credential, GoogleAuth, TokenSource};
pub use drive::{DriveClient, DriveItem};
pub use oauth::OAuthFlow;
