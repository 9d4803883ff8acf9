use std::net::SocketAddr;

use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "-h" | "--help" => {
                eprintln!(
                    "osbench-testserver\n\nUSAGE:\n  osbench-testserver [--bind 127.0.0.1:0]\n\nOUTPUT:\n  Prints AUTH_URL=<url> to stdout once ready. Credentials: {} / {}.",
                    osbench_testserver::USER,
                    osbench_testserver::KEY,
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let stats = osbench_testserver::TestServerStats::default();
    let app = osbench_testserver::router(stats);

    println!("AUTH_URL=http://{addr}{}", osbench_testserver::PATH_AUTH);

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
    });

    serve.await?;
    Ok(())
}
