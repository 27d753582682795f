//! Integration tests for the edit protocol: authorization, validation, propagation and persistence.

use bracket_edit::{
    change_handler, BracketError, ChangeError, ChangesValidator, Database, Edit, Information,
    Match, PlayerNameEdit, ScoreEdit, Status, Store, StoreError, Tournament, TournamentId,
    Versioned, WinnerEdit,
};
use serde_json::{json, Value};

const ORGANIZER: u64 = 1;
const REFEREE: u64 = 2;
const STRANGER: u64 = 99;

/// Match 0 (10 vs 20) sends its winner to slot p1 of match 1, where 30 waits.
fn two_match_bracket() -> Tournament {
    Tournament {
        id: 0,
        information: Information {
            name: "Friday".to_string(),
            organizer: ORGANIZER,
            referees: vec![REFEREE],
        },
        players: [(10, "Ann"), (20, "Bob"), (30, "Cid")]
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect(),
        status: Status::Started,
        matches: vec![
            Match {
                p1: Some(10),
                p2: Some(20),
                winner_next: Some(1),
                ..Match::new()
            },
            Match {
                p2: Some(30),
                ..Match::new()
            },
        ],
        origins: [(1, vec![0])].into_iter().collect(),
    }
}

fn store_with(t: &Tournament) -> (Database, TournamentId) {
    let db = Database::in_memory();
    let id = db.insert(serde_json::to_value(t).unwrap()).unwrap();
    (db, id)
}

fn stored(db: &Database, id: TournamentId) -> Versioned {
    db.load(id).unwrap().unwrap()
}

fn stored_tournament(db: &Database, id: TournamentId) -> Tournament {
    Tournament::from_record(stored(db, id).record).unwrap()
}

fn winner_edit(match_id: usize, edited: Option<u32>) -> Edit {
    Edit::WinnerEdit(WinnerEdit { match_id, edited })
}

fn edit(db: &Database, user: u64, id: TournamentId, e: Edit) -> Result<Tournament, ChangeError> {
    change_handler(user, db, &ChangesValidator, id, e)
}

#[test]
fn winner_edit_then_change_winner() {
    let (db, id) = store_with(&two_match_bracket());

    edit(&db, ORGANIZER, id, winner_edit(0, Some(10))).unwrap();
    let t = stored_tournament(&db, id);
    assert_eq!(t.matches[0].winner, Some(10));
    assert_eq!(t.matches[1].p1, Some(10));
    assert_eq!(t.matches[1].p2, Some(30));

    let returned = edit(&db, ORGANIZER, id, winner_edit(0, Some(20))).unwrap();
    let t = stored_tournament(&db, id);
    assert_eq!(t, returned);
    assert_eq!(t.matches[0].winner, Some(20));
    assert_eq!(t.matches[1].p1, Some(20));
    assert_eq!(stored(&db, id).revision, 3);
}

#[test]
fn clearing_winner_removes_propagation() {
    let (db, id) = store_with(&two_match_bracket());
    edit(&db, REFEREE, id, winner_edit(0, Some(20))).unwrap();
    edit(&db, REFEREE, id, winner_edit(0, None)).unwrap();
    let t = stored_tournament(&db, id);
    assert_eq!(t.matches[0].winner, None);
    assert_eq!(t.matches[1].p1, None);
}

#[test]
fn stranger_is_not_authorized() {
    let (db, id) = store_with(&two_match_bracket());
    let before = stored(&db, id);
    let err = edit(&db, STRANGER, id, winner_edit(0, Some(10))).unwrap_err();
    assert!(matches!(err, ChangeError::NotAuthorized));
    assert_eq!(stored(&db, id), before);
}

#[test]
fn unknown_tournament_is_bad_request() {
    let (db, _) = store_with(&two_match_bracket());
    let err = edit(&db, ORGANIZER, 42, winner_edit(0, Some(10))).unwrap_err();
    assert!(matches!(err, ChangeError::BadRequest(_)));
}

#[test]
fn setup_tournament_is_not_editable() {
    let db = Database::in_memory();
    let id = db
        .insert(json!({
            "information": { "name": "Soon", "organizer": ORGANIZER, "referees": [] },
            "players": { "10": "Ann" },
            "status": "setup"
        }))
        .unwrap();
    let err = edit(&db, ORGANIZER, id, winner_edit(0, Some(10))).unwrap_err();
    assert!(matches!(err, ChangeError::NotImplemented(_)));
}

#[test]
fn any_status_but_started_is_not_editable() {
    let mut record = serde_json::to_value(two_match_bracket()).unwrap();
    record["status"] = json!("finished");
    let db = Database::in_memory();
    let id = db.insert(record).unwrap();
    let before = stored(&db, id);
    let err = edit(&db, ORGANIZER, id, winner_edit(0, Some(10))).unwrap_err();
    assert!(matches!(err, ChangeError::NotImplemented(_)));
    assert_eq!(stored(&db, id), before);
}

#[test]
fn name_edit_renames_player() {
    let (db, id) = store_with(&two_match_bracket());
    let rename = Edit::NameEdit(PlayerNameEdit {
        player_id: 30,
        edited: "Cyd".to_string(),
    });
    edit(&db, ORGANIZER, id, rename).unwrap();
    let t = stored_tournament(&db, id);
    assert_eq!(t.players[&30], "Cyd");
    assert_eq!(t.matches, two_match_bracket().matches);
}

#[test]
fn score_edit_is_idempotent() {
    let (db, id) = store_with(&two_match_bracket());
    let score = Edit::ScoreEdit(ScoreEdit {
        match_id: 0,
        edited: [Some(3), Some(1)],
    });
    let once = edit(&db, ORGANIZER, id, score.clone()).unwrap();
    let twice = edit(&db, ORGANIZER, id, score).unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice.matches[0].scores(), [Some(3), Some(1)]);
    assert_eq!(twice.matches[0].winner, None);
    assert_eq!(twice.matches[1], two_match_bracket().matches[1]);
}

#[test]
fn invalid_edits_are_rejected_without_writing() {
    let (db, id) = store_with(&two_match_bracket());
    let before = stored(&db, id);
    let rejected = [
        winner_edit(0, Some(30)),
        winner_edit(1, Some(30)),
        winner_edit(7, None),
        Edit::ScoreEdit(ScoreEdit {
            match_id: 0,
            edited: [Some(3), None],
        }),
        Edit::NameEdit(PlayerNameEdit {
            player_id: 77,
            edited: "Nobody".to_string(),
        }),
        Edit::NameEdit(PlayerNameEdit {
            player_id: 10,
            edited: "   ".to_string(),
        }),
    ];
    for e in rejected {
        let err = edit(&db, ORGANIZER, id, e.clone()).unwrap_err();
        assert!(matches!(err, ChangeError::BadRequest(_)), "{:?} gave {:?}", e, err);
    }
    assert_eq!(stored(&db, id), before);
}

#[test]
fn decided_downstream_blocks_winner_change() {
    let mut t = two_match_bracket();
    t.matches[0].winner = Some(10);
    t.matches[1].p1 = Some(10);
    t.matches[1].winner = Some(30);
    let (db, id) = store_with(&t);
    let err = edit(&db, ORGANIZER, id, winner_edit(0, Some(20))).unwrap_err();
    assert!(matches!(err, ChangeError::BadRequest(_)));
}

#[test]
fn inconsistent_history_aborts_without_writing() {
    // winner recorded but never propagated into match 1
    let mut t = two_match_bracket();
    t.matches[0].winner = Some(10);
    let (db, id) = store_with(&t);
    let before = stored(&db, id);

    let err = edit(&db, ORGANIZER, id, winner_edit(0, Some(20))).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        ChangeError::Invariant(BracketError::CannotUndo {
            match_id: 1,
            player: 10
        })
    ));
    assert_eq!(stored(&db, id), before);
}

#[test]
fn corrupted_graph_is_fatal() {
    let mut record = serde_json::to_value(two_match_bracket()).unwrap();
    record["origins"] = json!({});
    let db = Database::in_memory();
    let id = db.insert(record).unwrap();
    let err = edit(&db, ORGANIZER, id, winner_edit(0, Some(10))).unwrap_err();
    assert!(matches!(
        err,
        ChangeError::Invariant(BracketError::InvalidGraph(_))
    ));
}

#[test]
fn failed_snapshot_write_keeps_previous_state() {
    let mut record = serde_json::to_value(two_match_bracket()).unwrap();
    record["id"] = json!(1);
    let bytes = serde_json::to_vec(&json!({ "tournaments": [record] })).unwrap();
    let path = std::env::temp_dir()
        .join(format!("bracket-no-dir-{}", std::process::id()))
        .join("db.json");
    let db = Database::from_snapshot(&bytes, Some(path)).unwrap();
    let before = stored(&db, 1);

    let err = edit(&db, ORGANIZER, 1, winner_edit(0, Some(10))).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ChangeError::Store(StoreError::Io(_))));
    assert_eq!(stored(&db, 1), before);
    assert_eq!(stored_tournament(&db, 1).matches[0].winner, None);
}

/// Lets another writer replace the record right after every load.
struct RacingStore {
    inner: Database,
}

impl Store for RacingStore {
    fn load(&self, id: TournamentId) -> Result<Option<Versioned>, StoreError> {
        let loaded = self.inner.load(id)?;
        if let Some(v) = &loaded {
            self.inner.replace(id, v.record.clone(), v.revision)?;
        }
        Ok(loaded)
    }

    fn replace(&self, id: TournamentId, record: Value, expected: u64) -> Result<u64, StoreError> {
        self.inner.replace(id, record, expected)
    }
}

#[test]
fn concurrent_replace_is_a_conflict() {
    let (inner, id) = store_with(&two_match_bracket());
    let store = RacingStore { inner };
    let err = change_handler(ORGANIZER, &store, &ChangesValidator, id, winner_edit(0, Some(10)))
        .unwrap_err();
    assert!(matches!(err, ChangeError::Conflict));
    let t = stored_tournament(&store.inner, id);
    assert_eq!(t.matches[0].winner, None);
    assert_eq!(t.matches[1].p1, None);
}

#[test]
fn edit_payloads_parse_from_wire_json() {
    let e: Edit = serde_json::from_str(r#"{"type":"winnerEdit","matchId":0,"edited":null}"#).unwrap();
    assert_eq!(e, winner_edit(0, None));

    let e: Edit = serde_json::from_str(r#"{"type":"scoreEdit","matchId":2,"edited":[3,null]}"#).unwrap();
    assert_eq!(
        e,
        Edit::ScoreEdit(ScoreEdit {
            match_id: 2,
            edited: [Some(3), None]
        })
    );

    let e: Edit = serde_json::from_str(r#"{"type":"nameEdit","playerId":10,"edited":"Ann"}"#).unwrap();
    assert_eq!(e.match_id(), None);
    assert_eq!(winner_edit(3, None).match_id(), Some(3));

    assert!(serde_json::from_str::<Edit>(r#"{"type":"bracketEdit","matchId":0}"#).is_err());
}
