use core::fmt;
use std::{cell::Cell, rc::Rc};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use wthing::{
    JsonBuffer, Property, PropertyType, Thing, Visibility,
    log::{Level, Logger},
    log_args,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Thing Description
    Td,
    /// Current values of the properties visible to web things
    Values,
    /// One topic and payload line per MQTT state message
    Mqtt,
}

#[derive(Parser)]
struct Args {
    /// Thing id, also used in hrefs and topics
    #[arg(long, default_value = "thermostat")]
    id: String,

    /// What to print
    #[arg(long, value_enum, default_value = "td")]
    mode: Mode,

    /// Commands to apply first, as `topic=payload`
    #[arg(long = "set", value_name = "TOPIC=PAYLOAD")]
    commands: Vec<String>,

    /// Level of the device log written to stderr (name or 0-6)
    #[arg(long, default_value = "notice")]
    log_level: Level,
}

/// Sink that writes the device log to stderr.
struct Stderr;

impl fmt::Write for Stderr {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        eprint!("{s}");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    wthing::log::init();

    let args = Args::parse();
    let mut log = Logger::new(args.log_level, Stderr, true);

    let mut thing = thermostat(&args.id);
    log.notice("built %s with %d properties", log_args![
        thing.href().as_str(),
        thing.properties().len() as u32,
    ]);

    for command in &args.commands {
        let (topic, payload) = command
            .split_once('=')
            .with_context(|| format!("expected topic=payload, got {command:?}"))?;

        match thing.handle_raw(topic, payload) {
            Ok(applied) => log.trace("%s <- %s (%T)", log_args![topic, payload, applied]),
            Err(e) => {
                let message = e.to_string();
                log.error("%s: %s", log_args![topic, message.as_str()]);
            }
        }
    }

    let mut json = JsonBuffer::new();
    match args.mode {
        Mode::Td => thing.to_json_structure(&mut json),
        Mode::Values => thing.to_json_values(&mut json, Visibility::WebthingOnly),
        Mode::Mqtt => {
            for (topic, payload) in thing.mqtt_messages()? {
                println!("{topic} {payload}");
            }
            return Ok(());
        }
    }
    println!("{}", json.as_str());

    Ok(())
}

fn thermostat(id: &str) -> Thing {
    let mut thing = Thing::new(id, "Thermostat");
    thing.add_at_type("Thermostat");

    // stands in for a sensor driver that is polled on read
    let readings = Rc::new(Cell::new(0_u32));
    let temperature = thing.add_property(Property::new(
        "temperature",
        "Temperature",
        "Measured room temperature",
        PropertyType::Double,
    ));
    temperature.set_read_only(true);
    temperature.set_unit("°C");
    temperature.set_on_value_request(move |p| {
        readings.set(readings.get() + 1);
        p.set_double(20.0 + f64::from(readings.get() % 4) * 0.5);
    });

    let target = thing.add_property(Property::new(
        "target",
        "Target",
        "Requested room temperature",
        PropertyType::Double,
    ));
    target.set_unit("°C");
    target.set_multiple_of(0.5);
    target.set_double(21.0);
    target.set_on_change(|p| {
        tracing::info!(property = %p.id(), value = ?p.value(), "target changed");
    });

    let mode = thing.add_property(Property::with_length(
        "mode",
        "Mode",
        "",
        PropertyType::String,
        8,
    ));
    for value in ["off", "heat", "cool", "auto"] {
        mode.add_enum_string(value);
    }
    mode.set_string("auto");

    let heating = thing.add_property(Property::new("heating", "Heating", "", PropertyType::Boolean));
    heating.set_read_only(true);
    heating.set_visibility(Visibility::MqttOnly);
    heating.set_boolean(false);

    thing
}
