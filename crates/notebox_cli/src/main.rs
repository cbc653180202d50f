//! CLI smoke entry point.
//!
//! Runs one create/list/get/update/delete cycle against the configured store
//! (`NOTEBOX_DB_PATH`, in-memory by default) as the caller named by the first
//! argument.

use log::info;
use notebox_core::{
    core_version, Caller, CoreConfig, CreateNoteInput, NoteChanges, NoteFilter, NoteService,
};
use std::error::Error;
use std::process::ExitCode;

const DEFAULT_CALLER: &str = "demo";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("notebox: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env();
    config.validate()?;
    config.init_logging()?;
    info!("event=cli_start module=cli status=ok version={}", core_version());

    let caller = Caller::new(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| DEFAULT_CALLER.to_string()),
    );
    let service = NoteService::new(config.open_store()?);

    let created = service.create_note(
        CreateNoteInput::new("Groceries", "milk, eggs"),
        &caller,
    )?;
    println!("created id={} owner={}", created.id, created.owner);

    let matches = service.get_all_notes(&caller.id, &NoteFilter::keyword("MILK"))?;
    println!("keyword=MILK matches={}", matches.len());

    let id = created.id.to_string();
    let updated = service.update_note(&id, &NoteChanges::title("Groceries v2"))?;
    println!("updated id={} title={}", updated.id, updated.title);

    let fetched = service.get_note_by_id(&id)?;
    println!("fetched id={} updated_at={}", fetched.id, fetched.updated_at);

    let deleted = service.delete_note(&id)?;
    println!("deleted id={}", deleted.id);

    match service.get_note_by_id("not-an-id") {
        Err(err) => println!("get not-an-id -> {} ({err})", err.code()),
        Ok(note) => println!("get not-an-id -> unexpected note {}", note.id),
    }

    println!("notebox_core version={}", core_version());
    Ok(())
}
