#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example session_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> toynet::Result<()> {
    use toynet::{Dataset, InitMode, OptimizerKind, Session, TrainerConfig};

    env_logger::init();

    let cfg = TrainerConfig {
        optimizer: OptimizerKind::SgdMomentum,
        learning_rate: 0.05,
        init_mode: InitMode::HeNormal,
        hidden1: 8,
        hidden2: 8,
        seed: 3,
        ..TrainerConfig::default()
    };

    let json = cfg.to_json_string_pretty()?;
    println!("{json}");

    let restored = TrainerConfig::from_json_str(&json)?;
    let mut session = Session::with_config(restored, 16);
    session.set_dataset(Dataset::from_rows(
        &[[-0.6, 0.2], [-0.4, -0.3], [0.5, 0.1], [0.7, -0.2]],
        &[0, 0, 1, 1],
    )?);

    for _ in 0..200 {
        session.step_train();
    }
    println!(
        "epochs={} loss={:.4} acc={:.3}",
        session.epoch_count(),
        session.last_loss(),
        session.last_accuracy()
    );

    // Partial configs fill in defaults.
    let partial = TrainerConfig::from_json_str(r#"{ "optimizer": "adam", "batch_size": 8 }"#)?;
    session.trainer_mut().apply_config(partial);
    println!("applied: {:?}", session.trainer().config());

    Ok(())
}
