use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = retro_visualizer::config::Config::parse();
    if cfg.list_devices {
        retro_visualizer::audio::list_input_devices()?;
        return Ok(());
    }

    retro_visualizer::app::run(cfg)
}
