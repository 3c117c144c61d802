use log::{error, info};

use rust_linmodels::linear_regression;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let x = [1.0, 3.0, 4.0, 6.0, 7.0, 9.0, 11.0, 12.0, 14.0, 15.0];
    let y = [4.0, 7.0, 9.0, 12.0, 14.0, 18.0, 20.0, 24.0, 27.0, 29.0];

    match linear_regression(&x, &y) {
        Ok(fit) => {
            info!("{fit}");
            for &xi in &x {
                info!("x={xi:>5.1} fitted={:>7.3}", fit.predict(xi));
            }
        }
        Err(e) => {
            error!("regression failed: {e}");
            std::process::exit(1);
        }
    }
}
