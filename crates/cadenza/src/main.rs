use cadenza::{bootstrap, default_config, fatal};

#[tokio::main]
async fn main() {
    let app = match bootstrap(default_config()).await {
        Ok(app) => app,
        Err(err) => fatal("application", err),
    };

    app.run(std::env::args().collect(), true).await;
}
