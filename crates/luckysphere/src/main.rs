use anyhow::Context;
use luckysphere::config;
use luckysphere::sys::draw::SimulatedDraw;
use luckysphere::sys::session::Session;
use luckysphere::sys::{runtime, server, sink};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = config::load_or_setup();
    let service = SimulatedDraw::new(&config.prizes, config.draw.clone());

    let (sink_tx, sink_rx) = async_channel::unbounded();
    let session = Session::new(&config, service, StdRng::from_entropy(), sink_tx)
        .context("Failed to set up the lucky draw")?;

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx).context("Failed to start background services")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let presenter = tokio::spawn(sink::log_presentation(sink_rx));
        session.run(rx).await;
        presenter.abort();
    });

    server::remove_socket();
    Ok(())
}
