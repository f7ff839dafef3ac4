use md5::{Digest, Md5};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";
const AVATAR_SIZE: u32 = 100;
const AVATAR_RATING: &str = "g";
const AVATAR_DEFAULT: &str = "retro";

/// Gravatar image for `email`: 100px, rated G, with the retro placeholder for unknown addresses.
pub fn gravatar_url(email: &str) -> String {
    let digest = Md5::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "{}{}?s={}&d={}&r={}",
        GRAVATAR_BASE,
        hex::encode(digest),
        AVATAR_SIZE,
        AVATAR_DEFAULT,
        AVATAR_RATING
    )
}
