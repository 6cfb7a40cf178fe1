use micro_message::{HostPolicy, Message};
use micro_message_factory::{Factory, RequestFactory, ResponseFactory, StreamFactory, UriFactory};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let factory = match Factory::builder().host_policy(HostPolicy::Overwrite).memory_limit(16 * 1024).build() {
        Ok(factory) => factory,
        Err(e) => {
            error!(cause = %e, "failed to build factory");
            return;
        }
    };

    let uri = factory.create_uri("http://Example.COM:80/greeting?lang=en").expect("valid uri");
    info!(%uri, host = ?uri.host(), port = ?uri.port(), "normalized uri");

    let request = factory
        .create_request("POST", uri)
        .and_then(|request| request.with_header("Content-Type", ["text/plain"]))
        .map(|request| request.with_body(factory.create_stream(b"Hello World!").expect("temp stream")))
        .expect("valid request");

    let moved = request.with_uri(factory.create_uri("https://api.example.com:8443/v2").expect("valid uri"));
    info!(
        method = %moved.method(),
        target = %moved.request_target(),
        host = %moved.header_line("host"),
        "request retargeted"
    );

    match factory.create_response(700, None) {
        Ok(_) => error!("status 700 should be rejected"),
        Err(e) => info!(cause = %e, kind = ?e.kind(), "invalid status rejected"),
    }

    let response = factory.create_response(200, None).expect("valid response");
    let body = request.body().lock().read_to_string_lossy().expect("readable body");
    info!(status = response.status_code(), reason = response.reason_phrase(), body = %body, "echo");
}
