use clap::Parser;
use crossbeam::channel::unbounded;
use dialoguer::Select;
use pedalsyncrs::{
    cli::{handle_device_list, validate_device, Args},
    clock::{MonotonicClock, SystemClock},
    config::EngineConfig,
    logging,
    midi::DefaultMidiTransport,
    pedal::{spawn_stdin_reader, KeyboardLines, LogIndicators},
    ui::StatusDisplay,
    EventLoop,
};
use std::{thread, time::Duration};

/// How long a typed tap holds its pedal down. Longer than the debounce window.
const TAP_LENGTH: Duration = Duration::from_millis(100);
const STATUS_REFRESH_US: u64 = 100_000;

fn main() {
    initialize_logging();
    let args = Args::parse();
    let devices = handle_device_list();

    if args.device_list {
        list_available_devices(&devices);
        return;
    }

    let config = match EngineConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(&format!("Error loading configuration: {}", e)),
    };

    let device_name = match &args.bind_to_device {
        Some(name) => {
            if let Err(error_msg) = validate_device(name, &devices) {
                // Not fatal: the loop keeps trying to connect.
                log::warn!("{}", error_msg);
                eprintln!("{}Waiting for '{}' to appear...", error_msg, name);
            }
            name.clone()
        }
        None => select_device(&devices),
    };

    run_application_loop(&config, device_name);
}

fn initialize_logging() {
    match logging::init_logger() {
        Ok(path) => log::info!("Application starting, logging to {}", path.display()),
        Err(e) => fail(&format!("Logger initialization failed: {}", e)),
    }
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

fn select_device(devices: &[String]) -> String {
    if devices.is_empty() {
        fail("No MIDI output devices found; connect one or pass --bind-to-device");
    }

    match Select::new()
        .with_prompt("MIDI device to control")
        .items(devices)
        .default(0)
        .interact_opt()
    {
        Ok(Some(index)) => devices[index].clone(),
        Ok(None) => fail("No device selected"),
        Err(e) => fail(&format!("Device selection failed: {}", e)),
    }
}

fn run_application_loop(config: &EngineConfig, device_name: String) {
    let (command_tx, command_rx) = unbounded();
    spawn_stdin_reader(command_tx);

    let lines = KeyboardLines::new(command_rx, TAP_LENGTH);
    let transport = DefaultMidiTransport::new(device_name, config.reconnect_interval_us);
    let mut event_loop = EventLoop::new(
        config,
        lines,
        LogIndicators::default(),
        transport,
        SystemClock::new(),
    );

    let mut display = StatusDisplay::new(config.ticks_per_beat);
    let display_clock = SystemClock::new();
    let mut next_refresh = 0;

    log::info!("Application running. Press Ctrl+C to exit...");
    eprintln!("Pedals: p=prev n=next y=play c=pause t=tap, hold/release <pedal>. Ctrl+C exits.");

    loop {
        let report = event_loop.run_once();
        if report.pulse {
            display.on_pulse();
        }

        let now = display_clock.now();
        if now >= next_refresh {
            display.update(event_loop.snapshot());
            next_refresh = now + STATUS_REFRESH_US;
        }

        thread::yield_now();
    }
}

fn fail(error_msg: &str) -> ! {
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    std::process::exit(1);
}
