// CLASSIFICATION: COMMUNITY
// Filename: main.rs v2.0
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Entry point for the `tagrelayd` access controller daemon.

use std::sync::atomic::AtomicBool;

use clap::Parser;
use log::info;
use tagrelay::config::{Backend, Cli, DaemonConfig};
use tagrelay::device::clock::SystemRtc;
use tagrelay::device::{Device, FIRMWARE_VERSION};
use tagrelay::http::ControlServer;
use tagrelay::hw::drivers::relay::HostPin;
use tagrelay::store::{ByteStore, FileStore, MemStore};

fn open_store(cfg: &DaemonConfig) -> anyhow::Result<Box<dyn ByteStore>> {
    Ok(match cfg.backend {
        Backend::Memory => {
            info!("store: volatile {} byte image", cfg.image_size);
            Box::new(MemStore::new(cfg.image_size))
        }
        Backend::File => {
            info!("store: {}", cfg.image.display());
            Box::new(FileStore::open(&cfg.image, cfg.image_size)?)
        }
    })
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = DaemonConfig::load(&cli)?;
    info!("tagrelayd {} starting", FIRMWARE_VERSION);

    let store = open_store(&cfg)?;
    let mut device = Device::boot(
        store,
        HostPin::new(cfg.relay_pin),
        SystemRtc::default(),
        &cfg.boot_options(),
    )?;
    let server = ControlServer::bind(&cfg.listen)?;
    let shutdown = AtomicBool::new(false);
    server.serve(&mut device, &shutdown)?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("tagrelayd: {err:#}");
        std::process::exit(1);
    }
}
