use intersection_estimator::Estimator;

fn main() -> Result<(), intersection_estimator::EstimatorError> {
    let mut estimator1 = Estimator::new(2048)?;
    for i in 0..10_000usize {
        estimator1.insert(&i);
    }
    println!("estimator1 estimate = {}", estimator1.count());

    let mut estimator2 = Estimator::new(2048)?;
    for i in 5_000..15_000usize {
        estimator2.insert(&i);
    }
    println!("estimator2 estimate = {}", estimator2.count());

    let union = estimator1.merge(&estimator2)?;
    println!("union estimate = {}", union.count());
    println!("intersection estimate = {}", estimator1.intersect(&estimator2)?);

    Ok(())
}
