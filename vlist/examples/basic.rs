// Example: fixed-size list, visible range and scroll-to helper.
use vlist::{Align, HeightOracle, RangeCalculator, Sizing};

fn main() -> Result<(), vlist::ConfigError> {
    let oracle = HeightOracle::new(Sizing::Fixed(40), 10_000)?;
    let calc = RangeCalculator::new(3);

    println!("total_extent={}", oracle.total_extent());
    println!("at 0: {:?}", calc.compute_range(&oracle, 0, 400));
    println!("at 4000: {:?}", calc.compute_range(&oracle, 4_000, 400));

    let off = RangeCalculator::scroll_offset_for(&oracle, 9_999, Align::End, 400, 0);
    println!("scroll_to_index(9999, End) -> {off:?}");
    Ok(())
}
