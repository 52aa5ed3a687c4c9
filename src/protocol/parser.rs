//! Command parser for the line-oriented front end.
//!
//! Parses one line of input into a `Command` the main loop can dispatch on.
//! Malformed lines are logged and skipped.

use chrono::Duration;
use tracing::warn;

use crate::store::PersonId;
use crate::territory::{Category, Coordinates, TerritoryId};

/// A parsed front-end command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Synchronization ping; replies `readyok`.
    IsReady,

    /// `create <category> <lat> <lng> <name...>`
    Create {
        category: Category,
        coordinates: Coordinates,
        name: String,
    },

    /// `settle <id> <team>=<points>...`. Points are kept signed so the
    /// settlement layer can reject negative requests as a whole.
    Settle {
        id: TerritoryId,
        requests: Vec<(String, i64)>,
    },

    /// `show <id> [person]`
    Show {
        id: TerritoryId,
        person: Option<PersonId>,
    },

    /// `list [person]`
    List { person: Option<PersonId> },

    /// `bonus <id> <person>`: records a completed visit bonus at now.
    Bonus { id: TerritoryId, person: PersonId },

    /// `advance <duration>`, e.g. `advance 25h`.
    Advance { by: Duration },

    /// Prints the current clock time.
    Now,

    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines, unknown commands, and malformed
/// arguments.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    match tokens[0] {
        "isready" => Some(Command::IsReady),
        "now" => Some(Command::Now),
        "quit" => Some(Command::Quit),

        "create" => parse_create(&tokens),
        "settle" => parse_settle(&tokens),
        "show" => parse_show(&tokens),
        "list" => Some(Command::List {
            person: tokens.get(1).map(|p| PersonId::new(*p)),
        }),
        "bonus" => parse_bonus(&tokens),
        "advance" => parse_advance(&tokens),

        other => {
            warn!("unknown command: {}", other);
            None
        }
    }
}

/// Parses `create <category> <lat> <lng> <name...>`.
fn parse_create(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 5 {
        warn!("malformed create: expected 'create <category> <lat> <lng> <name>'");
        return None;
    }
    let category = match Category::from_name(tokens[1]) {
        Some(c) => c,
        None => {
            warn!("unknown category: '{}'", tokens[1]);
            return None;
        }
    };
    let coordinates = match (tokens[2].parse::<f64>(), tokens[3].parse::<f64>()) {
        (Ok(lat), Ok(lng)) => Coordinates::new(lat, lng),
        _ => None,
    };
    let coordinates = match coordinates {
        Some(c) => c,
        None => {
            warn!("invalid coordinates: '{} {}'", tokens[2], tokens[3]);
            return None;
        }
    };
    Some(Command::Create {
        category,
        coordinates,
        name: tokens[4..].join(" "),
    })
}

/// Parses `settle <id> <team>=<points>...`.
fn parse_settle(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed settle: expected 'settle <id> <team>=<points>...'");
        return None;
    }
    let mut requests = Vec::with_capacity(tokens.len() - 2);
    for token in &tokens[2..] {
        let parsed = token
            .split_once('=')
            .and_then(|(team, points)| points.parse::<i64>().ok().map(|p| (team.to_string(), p)));
        match parsed {
            Some(request) => requests.push(request),
            None => {
                warn!("invalid reward entry: '{}'", token);
                return None;
            }
        }
    }
    Some(Command::Settle {
        id: TerritoryId::new(tokens[1]),
        requests,
    })
}

/// Parses `show <id> [person]`.
fn parse_show(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed show: expected 'show <id> [person]'");
        return None;
    }
    Some(Command::Show {
        id: TerritoryId::new(tokens[1]),
        person: tokens.get(2).map(|p| PersonId::new(*p)),
    })
}

/// Parses `bonus <id> <person>`.
fn parse_bonus(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 {
        warn!("malformed bonus: expected 'bonus <id> <person>'");
        return None;
    }
    Some(Command::Bonus {
        id: TerritoryId::new(tokens[1]),
        person: PersonId::new(tokens[2]),
    })
}

/// Parses `advance <duration>`.
fn parse_advance(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed advance: expected 'advance <duration>'");
        return None;
    }
    match parse_duration(tokens[1]) {
        Some(by) => Some(Command::Advance { by }),
        None => {
            warn!("invalid duration: '{}'", tokens[1]);
            None
        }
    }
}

/// Parses a non-negative duration such as `500ms`, `30s`, `90m`, `25h` or
/// `21d`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    let (amount, unit) = s.split_at(split);
    let amount: i64 = amount.parse().ok()?;
    match unit {
        "ms" => Duration::try_milliseconds(amount),
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("isready"), Some(Command::IsReady));
        assert_eq!(parse_command("now"), Some(Command::Now));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("list"), Some(Command::List { person: None }));
        assert_eq!(
            parse_command("list anna"),
            Some(Command::List {
                person: Some(PersonId::new("anna")),
            })
        );
    }

    #[test]
    fn parse_empty_and_comment_lines() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command("# just a note"), None);
    }

    #[test]
    fn parse_unknown_command_returns_none() {
        assert_eq!(parse_command("conquer everything"), None);
    }

    #[test]
    fn parse_create_with_multiword_name() {
        let cmd = parse_command("create gastronomy 46.948 7.447 Café Fédéral").unwrap();
        assert_eq!(
            cmd,
            Command::Create {
                category: Category::Gastronomy,
                coordinates: Coordinates::new(46.948, 7.447).unwrap(),
                name: "Café Fédéral".to_string(),
            }
        );
    }

    #[test]
    fn parse_create_malformed_returns_none() {
        assert_eq!(parse_command("create retail 1.0 2.0"), None);
        assert_eq!(parse_command("create bakery 1.0 2.0 Beck"), None);
        assert_eq!(parse_command("create retail north 2.0 Shop"), None);
        assert_eq!(parse_command("create retail 95.0 2.0 Shop"), None);
    }

    #[test]
    fn parse_settle_keeps_order_and_sign() {
        let cmd = parse_command("settle abc red=8 blue=5 green=-1").unwrap();
        assert_eq!(
            cmd,
            Command::Settle {
                id: TerritoryId::new("abc"),
                requests: vec![
                    ("red".to_string(), 8),
                    ("blue".to_string(), 5),
                    ("green".to_string(), -1),
                ],
            }
        );
        assert_eq!(
            parse_command("settle abc"),
            Some(Command::Settle {
                id: TerritoryId::new("abc"),
                requests: vec![],
            })
        );
    }

    #[test]
    fn parse_settle_malformed_returns_none() {
        assert_eq!(parse_command("settle"), None);
        assert_eq!(parse_command("settle abc red"), None);
        assert_eq!(parse_command("settle abc red=lots"), None);
    }

    #[test]
    fn parse_show_and_bonus() {
        assert_eq!(
            parse_command("show abc"),
            Some(Command::Show {
                id: TerritoryId::new("abc"),
                person: None,
            })
        );
        assert_eq!(
            parse_command("show abc anna"),
            Some(Command::Show {
                id: TerritoryId::new("abc"),
                person: Some(PersonId::new("anna")),
            })
        );
        assert_eq!(
            parse_command("bonus abc anna"),
            Some(Command::Bonus {
                id: TerritoryId::new("abc"),
                person: PersonId::new("anna"),
            })
        );
        assert_eq!(parse_command("bonus abc"), None);
        assert_eq!(parse_command("show"), None);
    }

    #[test]
    fn parse_durations() {
        assert_eq!(parse_duration("500ms"), Some(Duration::milliseconds(500)));
        assert_eq!(parse_duration("30s"), Some(Duration::seconds(30)));
        assert_eq!(parse_duration("90m"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("25h"), Some(Duration::hours(25)));
        assert_eq!(parse_duration("21d"), Some(Duration::days(21)));
        assert_eq!(parse_duration("5"), None);
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("-1h"), None);
        assert_eq!(parse_duration("3w"), None);
    }

    #[test]
    fn parse_advance_command() {
        assert_eq!(
            parse_command("advance 1h"),
            Some(Command::Advance {
                by: Duration::hours(1),
            })
        );
        assert_eq!(parse_command("advance soon"), None);
        assert_eq!(parse_command("advance"), None);
    }

    #[test]
    fn parse_with_leading_trailing_whitespace() {
        assert_eq!(parse_command("  isready  "), Some(Command::IsReady));
    }
}
