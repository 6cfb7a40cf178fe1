use std::io::Write;

use micro_message::Message;
use micro_message::upload::UploadedFiles;
use micro_message_factory::{Factory, FileDescriptor, FileEntry, ServerRequestFactory, Snapshot};
use serde_json::json;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let dir = tempfile::tempdir().expect("temp dir");
    let upload_path = dir.path().join("upload-1");
    std::fs::File::create(&upload_path)
        .and_then(|mut file| file.write_all(b"\x89PNG fake image"))
        .expect("write upload");

    let snapshot = Snapshot::new("POST", "/profile?tab=photos")
        .with_header("Host", "example.com:8080")
        .with_header("Accept", "text/html")
        .with_header("Accept", "application/json")
        .with_cookie("session", "b4d5")
        .with_server_param("SERVER_PROTOCOL", "HTTP/1.1")
        .with_parsed_body(json!({"display_name": "micro"}))
        .with_uploaded_file(
            "photos",
            FileDescriptor::List(vec![
                FileEntry::new(&upload_path).client_filename("me.png").client_media_type("image/png").into(),
                FileEntry::new("").error(4).into(),
            ]),
        );

    let request = match Factory::new().create_server_request_from_globals(&snapshot) {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "failed to build server request");
            return;
        }
    };

    info!(
        uri = %request.uri(),
        accept = %request.header_line("accept"),
        tab = ?request.query_params().get("tab"),
        session = ?request.cookie_params().get("session"),
        "server request"
    );

    let Some(photos) = request.uploaded_files().get("photos") else {
        error!("no photos uploaded");
        return;
    };
    for (index, file) in photos.files().iter().enumerate() {
        if !file.error().is_ok() {
            info!(index, reason = %file.error(), "skipping failed upload");
            continue;
        }
        let target = dir.path().join(format!("photo-{index}.png"));
        match file.move_to(&target) {
            Ok(()) => info!(index, target = %target.display(), media_type = ?file.client_media_type_mime(), "stored"),
            Err(e) => error!(index, cause = %e, "failed to store upload"),
        }
    }

    if let Some(UploadedFiles::List(list)) = request.uploaded_files().get("photos") {
        info!(count = list.len(), "done");
    }
}
