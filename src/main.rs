use anyhow::{anyhow, Context, Result};
use iced::Font;

use side_chat::app::{self, App};
use side_chat::config::Config;
use side_chat::logging;
use side_chat::ollama::OllamaClient;

fn main() -> Result<()> {
    logging::init();

    let config = Config::load();
    let client = OllamaClient::new(&config.ollama).context("failed to set up the Ollama client")?;

    // iced wants a 'static family name; this runs once per process.
    let family: &'static str = Box::leak(config.style.font_family.clone().into_boxed_str());
    let font = Font::with_name(family);

    iced::application(App::title, App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(app::window_settings(&config))
        .default_font(font)
        .run_with(move || App::new(config.clone(), client.clone(), font))
        .map_err(|err| anyhow!("failed to start the window: {err}"))
}
