//! Front-end session state.
//!
//! Wires an in-memory store, visit log and manual clock to the ledger and
//! the settler, and writes one reply line per command. Time only moves on
//! `advance`, which makes sessions reproducible.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::warn;

use crate::clock::{Clock, ManualClock};
use crate::config::ScoringConfig;
use crate::ledger::{Ledger, TerritoryView};
use crate::settle::{Grant, Settler};
use crate::store::{MemoryStore, MemoryVisitLog, PersonId};
use crate::territory::{Category, Coordinates, TerritoryId};

/// Reply body of a `settle` command.
#[derive(Serialize)]
struct SettleReply<'a> {
    territory: TerritoryView,
    grants: &'a [Grant],
}

/// Holds the stores and services between commands.
pub struct Engine {
    config: Arc<ScoringConfig>,
    clock: Arc<ManualClock>,
    visits: Arc<MemoryVisitLog>,
    ledger: Ledger<MemoryStore, MemoryVisitLog>,
    settler: Settler<MemoryStore>,
    rng: SmallRng,
}

impl Engine {
    /// Creates a session whose clock starts at the current wall time.
    pub fn new(config: ScoringConfig) -> Self {
        Engine::with_start(config, Utc::now(), SmallRng::from_entropy())
    }

    /// Creates a session with a fixed start time and id generator.
    pub fn with_start(config: ScoringConfig, start: DateTime<Utc>, rng: SmallRng) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(MemoryStore::new());
        let visits = Arc::new(MemoryVisitLog::new());
        let clock = Arc::new(ManualClock::new(start));
        let ledger = Ledger::new(store.clone(), visits.clone(), clock.clone(), config.clone());
        let settler = Settler::new(store, clock.clone(), config.clone());
        Engine {
            config,
            clock,
            visits,
            ledger,
            settler,
            rng,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Handles `isready`.
    pub fn handle_isready<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "readyok")?;
        out.flush()
    }

    /// Handles `create`: replies with the new territory's view.
    pub fn handle_create<W: Write>(
        &mut self,
        out: &mut W,
        category: Category,
        coordinates: Coordinates,
        name: &str,
    ) -> io::Result<()> {
        let id = TerritoryId::random(&mut self.rng);
        match self.ledger.create(id, name, category, coordinates) {
            Ok(territory) => {
                let view = TerritoryView::project(&territory, territory.snapshot_time, &self.config, None);
                reply_json(out, "territory", &view)
            }
            Err(e) => reply_error(out, e),
        }
    }

    /// Handles `settle`: replies with the settled territory and the grants.
    pub fn handle_settle<W: Write>(
        &self,
        out: &mut W,
        id: &TerritoryId,
        requests: &[(String, i64)],
    ) -> io::Result<()> {
        let requests = requests.iter().map(|(team, points)| (team.as_str(), *points));
        match self.settler.settle_requests(id, requests) {
            Ok(settlement) => {
                let territory = &settlement.territory;
                let reply = SettleReply {
                    territory: TerritoryView::project(
                        territory,
                        territory.snapshot_time,
                        &self.config,
                        None,
                    ),
                    grants: &settlement.grants,
                };
                reply_json(out, "settled", &reply)
            }
            Err(e) => reply_error(out, e),
        }
    }

    /// Handles `show`.
    pub fn handle_show<W: Write>(
        &self,
        out: &mut W,
        id: &TerritoryId,
        person: Option<&PersonId>,
    ) -> io::Result<()> {
        match self.ledger.view(id, person) {
            Ok(view) => reply_json(out, "territory", &view),
            Err(e) => reply_error(out, e),
        }
    }

    /// Handles `list`.
    pub fn handle_list<W: Write>(&self, out: &mut W, person: Option<&PersonId>) -> io::Result<()> {
        match self.ledger.list(person) {
            Ok(views) => reply_json(out, "territories", &views),
            Err(e) => reply_error(out, e),
        }
    }

    /// Handles `bonus`: records a visit bonus completed now and replies with
    /// the next eligible date.
    pub fn handle_bonus<W: Write>(
        &self,
        out: &mut W,
        id: &TerritoryId,
        person: &PersonId,
    ) -> io::Result<()> {
        if let Err(e) = self.ledger.ensure_exists(id) {
            return reply_error(out, e);
        }
        self.visits.record_bonus(id.clone(), person.clone(), self.clock.now());
        match self.ledger.next_visit_bonus_date(id, person) {
            Ok(next) => {
                writeln!(out, "bonus {} {} next {}", id, person, format_time(next))?;
                out.flush()
            }
            Err(e) => reply_error(out, e),
        }
    }

    /// Handles `advance`. A step past the representable time range is
    /// refused and the clock stays where it was.
    pub fn handle_advance<W: Write>(&self, out: &mut W, by: Duration) -> io::Result<()> {
        match self.clock.advance(by) {
            Some(_) => self.handle_now(out),
            None => reply_error(out, format!("cannot advance clock by {}", by)),
        }
    }

    /// Handles `now`.
    pub fn handle_now<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "now {}", format_time(self.clock.now()))?;
        out.flush()
    }
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn reply_json<W: Write, T: Serialize>(out: &mut W, keyword: &str, body: &T) -> io::Result<()> {
    let json = serde_json::to_string(body).map_err(io::Error::from)?;
    writeln!(out, "{} {}", keyword, json)?;
    out.flush()
}

fn reply_error<W: Write, E: std::fmt::Display>(out: &mut W, err: E) -> io::Result<()> {
    warn!("command failed: {}", err);
    writeln!(out, "error {}", err)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_duration;
    use crate::store::VisitLog;
    use chrono::TimeZone;
    use serde_json::Value;

    fn engine() -> Engine {
        Engine::with_start(
            ScoringConfig::default(),
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
            SmallRng::seed_from_u64(42),
        )
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    fn json_after(line: &str, keyword: &str) -> Value {
        let body = line
            .strip_prefix(keyword)
            .and_then(|rest| rest.strip_prefix(' '))
            .unwrap_or_else(|| panic!("expected '{}' reply, got: {}", keyword, line));
        serde_json::from_str(body).unwrap()
    }

    fn create(engine: &mut Engine) -> TerritoryId {
        let mut out = Vec::new();
        engine
            .handle_create(
                &mut out,
                Category::Gastronomy,
                Coordinates::new(46.948, 7.447).unwrap(),
                "Altes Tramdepot",
            )
            .unwrap();
        let view = json_after(output(out).trim(), "territory");
        TerritoryId::new(view["id"].as_str().unwrap())
    }

    #[test]
    fn isready_replies_readyok() {
        let mut out = Vec::new();
        engine().handle_isready(&mut out).unwrap();
        assert_eq!(output(out).trim(), "readyok");
    }

    #[test]
    fn create_replies_with_fresh_territory() {
        let mut engine = engine();
        let mut out = Vec::new();
        engine
            .handle_create(
                &mut out,
                Category::Retail,
                Coordinates::new(46.948, 7.447).unwrap(),
                "Loeb",
            )
            .unwrap();
        let view = json_after(output(out).trim(), "territory");
        assert_eq!(view["name"], "Loeb");
        assert_eq!(view["category"], "retail");
        assert_eq!(view["availablePoints"], 240);
        assert_eq!(view["controllingTeam"], Value::Null);
        assert_eq!(view["id"].as_str().unwrap().len(), 24);
    }

    #[test]
    fn settle_replies_with_grants() {
        let mut engine = engine();
        let id = create(&mut engine);
        engine.clock.advance(Duration::hours(1));

        let mut out = Vec::new();
        engine
            .handle_settle(&mut out, &id, &[("red".to_string(), 50)])
            .unwrap();
        let reply = json_after(output(out).trim(), "settled");
        assert_eq!(reply["territory"]["availablePoints"], 200);
        assert_eq!(reply["territory"]["pointsByTeam"]["red"], 50);
        assert_eq!(reply["territory"]["controllingTeam"], "red");
        assert_eq!(reply["grants"][0]["team"], "red");
        assert_eq!(reply["grants"][0]["granted"], 50);
    }

    #[test]
    fn settle_errors_are_reported() {
        let mut engine = engine();
        let id = create(&mut engine);

        let mut out = Vec::new();
        engine
            .handle_settle(&mut out, &id, &[("red".to_string(), -5)])
            .unwrap();
        assert!(output(out).starts_with("error invalid reward"));

        let mut out = Vec::new();
        engine
            .handle_settle(&mut out, &TerritoryId::new("ghost"), &[("red".to_string(), 5)])
            .unwrap();
        assert_eq!(output(out).trim(), "error territory 'ghost' not found");
    }

    #[test]
    fn bonus_sets_three_week_cooldown() {
        let mut engine = engine();
        let id = create(&mut engine);
        let anna = PersonId::new("anna");

        let mut out = Vec::new();
        engine.handle_show(&mut out, &id, Some(&anna)).unwrap();
        let view = json_after(output(out).trim(), "territory");
        assert_eq!(view["nextVisitBonusDate"], "2024-06-01T08:00:00Z");

        let mut out = Vec::new();
        engine.handle_bonus(&mut out, &id, &anna).unwrap();
        assert_eq!(
            output(out).trim(),
            format!("bonus {} anna next 2024-06-22T08:00:00.000Z", id)
        );

        let ghost = TerritoryId::new("ghost");
        let mut out = Vec::new();
        engine.handle_bonus(&mut out, &ghost, &anna).unwrap();
        assert_eq!(output(out).trim(), "error territory 'ghost' not found");
        assert_eq!(engine.visits.last_bonus_completion(&ghost, &anna), Ok(None));
    }

    #[test]
    fn advance_past_calendar_range_is_an_error() {
        let engine = engine();
        let by = parse_duration("100000000d").unwrap();

        let mut out = Vec::new();
        engine.handle_advance(&mut out, by).unwrap();
        assert!(output(out).starts_with("error cannot advance clock"));

        let mut out = Vec::new();
        engine.handle_now(&mut out).unwrap();
        assert_eq!(output(out).trim(), "now 2024-06-01T08:00:00.000Z");
    }

    #[test]
    fn advance_moves_clock_and_list_projects() {
        let mut engine = engine();
        create(&mut engine);
        create(&mut engine);

        let mut out = Vec::new();
        engine.handle_advance(&mut out, Duration::hours(25)).unwrap();
        assert_eq!(output(out).trim(), "now 2024-06-02T09:00:00.000Z");

        let mut out = Vec::new();
        engine.handle_list(&mut out, None).unwrap();
        let views = json_after(output(out).trim(), "territories");
        let views = views.as_array().unwrap();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v["availablePoints"] == 490));
    }
}
