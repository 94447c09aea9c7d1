// Example: estimated sizes corrected by measurements, then carried over to a fresh oracle.
use vlist::{HeightOracle, RangeCalculator, Sizing};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut v1 = HeightOracle::new(Sizing::Estimated(100), 5)?;
    v1.record_measurement(0, 100)?;
    v1.record_measurement(1, 100)?;
    let delta = v1.record_measurement(2, 120)?;
    println!("delta={delta} offset_of(3)={} total={}", v1.offset_of(3), v1.total_extent());

    let calc = RangeCalculator::new(0);
    println!("range at 210: {:?}", calc.compute_range(&v1, 210, 50));

    // Persisting measurements lets a new list start from real sizes.
    let snapshot = v1.export_measurements();
    let mut v2 = HeightOracle::new(Sizing::Estimated(100), 5)?;
    let imported = v2.import_measurements(&snapshot);
    println!("imported={imported} total={}", v2.total_extent());
    Ok(())
}
