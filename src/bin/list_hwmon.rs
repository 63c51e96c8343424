use clap::Parser;
use log::info;
use std::path::PathBuf;
use zenergy_wattage::hwmon::{read_energy_uj, survey, Hwmon, HWMON_DIR};

/// List every hwmon device with its energy channels and their current readings.
#[derive(Parser)]
#[command(author, version, about, long_about=None)]
struct CLI {
    #[arg(long, default_value = HWMON_DIR)]
    hwmon_dir: PathBuf,
}

fn main() {
    zenergy_wattage::init_logging();
    let args = CLI::parse();

    let devices = survey(&Hwmon::new(args.hwmon_dir));
    info!("Found {} hwmon devices", devices.len());
    for device in &devices {
        println!(
            "{}: {}",
            device.device.display(),
            device.name.as_deref().unwrap_or("<unreadable>")
        );
        for channel in &device.channels {
            match read_energy_uj(&channel.input) {
                Ok(energy_uj) => println!("\t{channel}: {energy_uj} µJ"),
                Err(e) => println!("\t{channel}: {e}"),
            }
        }
    }
}
