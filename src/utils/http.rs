use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

// Per-request timeouts come from `LlmSettings`; this only bounds connecting.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("comic_prompt_helper/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
