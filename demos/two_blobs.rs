//! Train on two Gaussian blobs and print an ASCII decision field.
//!
//! `RUST_LOG=debug cargo run --example two_blobs` shows the trainer's log lines.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use toynet::{DataPoint, Dataset, DecisionField, OptimizerKind, Trainer};

fn blobs(n: usize, spread: f32, seed: u64) -> toynet::Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0_f32, spread)
        .map_err(|e| toynet::Error::InvalidData(format!("bad spread: {e}")))?;

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let label = (i % 2) as u8;
        let cx = if label == 0 { -0.5 } else { 0.5 };
        points.push(DataPoint::new(
            (cx + noise.sample(&mut rng)).clamp(-1.0, 1.0),
            noise.sample(&mut rng).clamp(-1.0, 1.0),
            label,
        )?);
    }
    Dataset::from_points(points)
}

fn main() -> toynet::Result<()> {
    env_logger::init();

    let data = blobs(400, 0.15, 0)?;

    let mut trainer = Trainer::default();
    trainer.optimizer = OptimizerKind::Adam;
    trainer.learning_rate = 0.01;
    trainer.auto_train = true;
    trainer.auto_max_epochs = 1_000;

    while trainer.auto_train_epochs(&data) {
        if trainer.epoch_count() % 100 == 0 {
            println!(
                "epoch={} loss={:.4} acc={:.3}",
                trainer.epoch_count(),
                trainer.last_loss(),
                trainer.last_accuracy()
            );
        }
    }

    let stats = trainer.network().evaluate(&data);
    println!(
        "stopped at epoch={} full-dataset loss={:.4} acc={:.3}",
        trainer.epoch_count(),
        stats.loss,
        stats.accuracy
    );

    let mut field = DecisionField::new(32);
    field.sample(trainer.network());
    let res = field.resolution();
    for j in (0..res).rev() {
        let row: String = field.probs()[j * res..(j + 1) * res]
            .iter()
            .map(|&p| match p {
                p if p < 0.25 => '.',
                p if p < 0.5 => '-',
                p if p < 0.75 => '+',
                _ => '#',
            })
            .collect();
        println!("{row}");
    }

    Ok(())
}
