//! Reading what was written gives back the same file

use super::*;
use crate::app::models::OutOfBand;
use proptest::prelude::*;

fn assert_same_cells(left: &DataFile, right: &DataFile) {
    let oob = OutOfBand::default();
    assert_eq!(left.len(), right.len());
    assert_eq!(
        left.mnemonics().collect::<Vec<_>>(),
        right.mnemonics().collect::<Vec<_>>()
    );
    for column in left.columns() {
        let other = right.column(column.mnemonic()).unwrap();
        assert_eq!(column.flags_woce, other.flags_woce, "{}", column.mnemonic());
        assert_eq!(column.flags_igoss, other.flags_igoss, "{}", column.mnemonic());
        for row in 0..column.len() {
            let (a, b) = (column.get(row), other.get(row));
            match (a.and_then(Value::as_decimal), b.and_then(Value::as_decimal)) {
                (Some(x), Some(y)) => assert!(
                    (x - y).abs() < oob.tolerance,
                    "{} row {}: {} != {}",
                    column.mnemonic(),
                    row,
                    x,
                    y
                ),
                _ => assert_eq!(a, b, "{} row {}", column.mnemonic(), row),
            }
        }
    }
}

#[test]
fn test_minimal_round_trip() {
    let file = read_str(MINIMAL).unwrap();
    let again = read_str(&write_str(&file)).unwrap();
    assert_same_cells(&file, &again);
    assert_eq!(again.stamp(), file.stamp());
}

#[test]
fn test_flagged_round_trip() {
    let file = read_str(TWO_CASTS).unwrap();
    let written = write_str(&file);
    let again = read_str(&written).unwrap();
    assert_same_cells(&file, &again);
    assert_eq!(again.header(), file.header());
    // Writing is stable
    assert_eq!(write_str(&again), written);
}

proptest! {
    #[test]
    fn prop_values_and_flags_survive(
        rows in prop::collection::vec(
            (1i64..500, 0i64..50_000, prop::option::of(1i16..10)),
            1..20
        )
    ) {
        let mut text = String::from("BOTTLE,20200101ABCDEF\nSTNNBR,CASTNO,SAMPNO,CTDPRS,CTDPRS_FLAG_W\n,,,DBAR,\n");
        for (i, (station, tenths, flag)) in rows.iter().enumerate() {
            let flag = flag.map(|f| f.to_string()).unwrap_or_else(|| "-999".to_string());
            text.push_str(&format!("{},1,{},{}.{},{}\n", station, i, tenths / 10, tenths % 10, flag));
        }
        text.push_str("END_DATA\n");

        let file = read_str(&text).unwrap();
        let again = read_str(&write_str(&file)).unwrap();
        prop_assert_eq!(file.len(), rows.len());
        assert_same_cells(&file, &again);
    }
}
