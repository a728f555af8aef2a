use super::{
    colorize_phase, json_pretty, make_remote_backend, spin_fail, spin_ok, spinner,
    state_payload, EXIT_GENERATION_FAILED, EXIT_SUCCESS,
};
use iospack_core::{GenerationStore, Generator};
use iospack_schema::RequestId;
use std::sync::Arc;

pub fn run(
    request_id: Option<i64>,
    remote_url: Option<&str>,
    token: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    // An invalid id is settled by the generator without a lookup, so the
    // remote config is only required for a valid one.
    let backend = if RequestId::from_raw(request_id).is_some() {
        Some(make_remote_backend(remote_url, token)?)
    } else {
        None
    };
    let generator = Generator::new(backend, Arc::new(GenerationStore::new()));

    let pb = (!json).then(|| spinner("fetching iOS package…"));
    let state = generator.request_generation(request_id);

    if let Some(pb) = &pb {
        match (state.archive_ref(), state.error()) {
            (Some(_), _) => spin_ok(pb, "package ready"),
            (None, Some(_)) => spin_fail(pb, "package generation failed"),
            (None, None) => pb.finish_and_clear(),
        }
    }

    if json {
        println!("{}", json_pretty(&state_payload(&state))?);
    } else {
        println!("state:    {}", colorize_phase(state.phase()));
        if let Some(id) = state.request_id() {
            println!("request:  {id}");
        }
        if let Some(archive) = state.archive_ref() {
            println!("archive:  {archive}");
        }
        if let Some(error) = state.error() {
            println!("error:    {error}");
        }
    }

    Ok(if state.archive_ref().is_some() {
        EXIT_SUCCESS
    } else {
        EXIT_GENERATION_FAILED
    })
}
