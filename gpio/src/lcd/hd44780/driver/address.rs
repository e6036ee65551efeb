/// Start of the second line in two-line mode. Fixed by the controller, not by the panel width.
pub const LINE_OFFSET: u16 = 64;
/// Offset of the odd rows from the even rows on 4-line panels.
pub const FOUR_LINE_ODD_OFFSET: u16 = 20;

/// DDRAM address of a (column, row) position.
///
/// - 2 rows: row 1 starts at 64.
/// - 4 rows: rows are paired, pair `n` starting at `64 * n`. The even row of a pair is at the
///   pair start, the odd row 20 past it.
/// - anything else: the column, row ignored. It still goes out as a Set DDRAM Address
///   instruction with bit 7 set, never as the bare column.
///
/// Nothing is checked against the panel size. The result may exceed the 7-bit address space and
/// is truncated when sent.
pub fn ddram_address(rows: u8, column: u8, row: u8) -> u16 {
    let (column, row) = (column as u16, row as u16);
    match rows {
        2 => LINE_OFFSET * row + column,
        4 if row % 2 == 0 => LINE_OFFSET * (row / 2) + column,
        4 => LINE_OFFSET * ((row - 1) / 2) + FOUR_LINE_ODD_OFFSET + column,
        _ => column,
    }
}
