use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::render;
use crate::Session;
use yieldtrack::{
    CropType, DashboardError, FertilizerType, FieldId, FieldParameters, GeminiClient,
    PredictionPanel, SoilType, Visibility,
};

/// One line typed at the dashboard prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show,
    Hide,
    Status,
    Toggle(FieldId),
    Auto(bool),
    Predict(FieldParameters),
    Help,
    Quit,
}

/// What the input loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument {arg}: {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Unterminated quote")]
    UnterminatedQuote,
}

impl CommandError {
    fn invalid(arg: impl Into<String>, message: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            arg: arg.into(),
            message: message.into(),
        }
    }
}

pub const HELP: &str = "\
commands:
  show | hide                 report the view as visible or hidden
  status                      print sensors, irrigation and prediction
  toggle <field1|field2|field3>
  auto <on|off>               automated irrigation
  predict crop_type=.. crop_name=.. field_area=.. soil_type=.. fertilizer=.. [previous_crop=..]
  help | quit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let tokens = tokenize(line)?;
    let Some((head, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "show" => Command::Show,
        "hide" => Command::Hide,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "toggle" => {
            let field = args.first().ok_or(CommandError::MissingArgument("field"))?;
            let field = field
                .parse::<FieldId>()
                .map_err(|e| CommandError::invalid("field", e.to_string()))?;
            Command::Toggle(field)
        }
        "auto" => match args.first().map(|a| a.to_ascii_lowercase()).as_deref() {
            Some("on") => Command::Auto(true),
            Some("off") => Command::Auto(false),
            Some(other) => {
                return Err(CommandError::invalid(
                    "auto",
                    format!("expected on or off, got '{}'", other),
                ))
            }
            None => return Err(CommandError::MissingArgument("on|off")),
        },
        "predict" => Command::Predict(parse_field_parameters(args)?),
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

/// Split on whitespace, keeping double-quoted runs together
fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if in_quotes {
        return Err(CommandError::UnterminatedQuote);
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_field_parameters(args: &[String]) -> Result<FieldParameters, CommandError> {
    let mut crop_type = None;
    let mut crop_name = None;
    let mut field_area = None;
    let mut soil_type = None;
    let mut fertilizer = None;
    let mut previous_crop = String::new();

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| CommandError::invalid(arg.as_str(), "expected key=value"))?;
        match key.to_ascii_lowercase().as_str() {
            "crop_type" => {
                crop_type = Some(
                    value
                        .parse::<CropType>()
                        .map_err(|e| CommandError::invalid(key, e))?,
                )
            }
            "crop_name" => crop_name = Some(value.to_string()),
            "field_area" => {
                let area = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| CommandError::invalid(key, format!("'{}' is not a number", value)))?;
                field_area = Some(area);
            }
            "soil_type" => {
                soil_type = Some(
                    value
                        .parse::<SoilType>()
                        .map_err(|e| CommandError::invalid(key, e))?,
                )
            }
            "fertilizer" | "fertilizer_used" => {
                fertilizer = Some(
                    value
                        .parse::<FertilizerType>()
                        .map_err(|e| CommandError::invalid(key, e))?,
                )
            }
            "previous_crop" => previous_crop = value.to_string(),
            _ => return Err(CommandError::invalid(key, "unknown form field")),
        }
    }

    Ok(FieldParameters {
        crop_type: crop_type.ok_or(CommandError::MissingArgument("crop_type"))?,
        crop_name: crop_name.ok_or(CommandError::MissingArgument("crop_name"))?,
        field_area: field_area.ok_or(CommandError::MissingArgument("field_area"))?,
        soil_type: soil_type.ok_or(CommandError::MissingArgument("soil_type"))?,
        fertilizer_used: fertilizer.ok_or(CommandError::MissingArgument("fertilizer"))?,
        previous_crop,
    })
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

/// Apply a parsed command to the running session
pub fn route_command(command: Command, session: &mut Session) -> Flow {
    info!(command = command_name(&command), "Routing command");

    match command {
        Command::Show => session.poller.set_visibility(Visibility::Visible),
        Command::Hide => session.poller.set_visibility(Visibility::Hidden),
        Command::Status => handle_status(session),
        Command::Toggle(field) => match session.irrigation.toggle(field) {
            Ok(on) => {
                info!(field = %field, on, "Irrigation toggled");
                println!("{} is now {}", field, if on { "ON" } else { "OFF" });
            }
            Err(e) => {
                warn!(field = %field, error = %e, "Irrigation toggle refused");
                println!("{}", e);
            }
        },
        Command::Auto(enabled) => {
            session.irrigation.set_auto_irrigation(enabled);
            info!(enabled, "Automated irrigation changed");
            println!("{}", session.irrigation.automation_status());
        }
        Command::Predict(fields) => handle_predict(session, fields),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Show => "show",
        Command::Hide => "hide",
        Command::Status => "status",
        Command::Toggle(_) => "toggle",
        Command::Auto(_) => "auto",
        Command::Predict(_) => "predict",
        Command::Help => "help",
        Command::Quit => "quit",
    }
}

fn handle_status(session: &Session) {
    let latest = session.poller.latest();
    println!(
        "poller: {:?} ({:?})",
        session.poller.state(),
        session.poller.visibility()
    );
    match &latest {
        Some(reading) => print_lines(render::reading_lines(reading)),
        None => println!("No sensor reading yet"),
    }
    print_lines(render::irrigation_lines(&session.irrigation, latest.as_ref()));
    if let Ok(panel) = &session.panel {
        print_lines(render::panel_lines(&panel.state()));
    }
}

fn handle_predict(session: &Session, fields: FieldParameters) {
    let panel: &Arc<PredictionPanel<GeminiClient>> = match &session.panel {
        Ok(panel) => panel,
        Err(message) => {
            let request_id = Uuid::new_v4().to_string();
            let err = DashboardError::Config(message.clone());
            warn!(request_id = %request_id, error = %err, "Prediction unavailable");
            match err.to_response(&request_id).to_json() {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{}", err),
            }
            return;
        }
    };

    let Some(reading) = session.poller.latest() else {
        println!("No sensor reading yet; try again after the next refresh");
        return;
    };

    let panel = Arc::clone(panel);
    tokio::spawn(async move {
        if let Err(DashboardError::Busy) = panel.predict(&reading.snapshot, &fields).await {
            println!("A prediction is already running");
        }
    });
}
