use crate::*;

/// 只回答「有沒有三連」，比 `Grid::find_match_groups` 便宜，不計算長度也不分組
pub fn has_line_of_three<T: PartialEq>(cells: &[T], size: usize) -> bool {
    if size < MIN_MATCH || cells.len() < size * size {
        return false;
    }
    for row in 0..size {
        for col in 0..size - 2 {
            let index = row * size + col;
            if cells[index] == cells[index + 1] && cells[index] == cells[index + 2] {
                return true;
            }
        }
    }
    for col in 0..size {
        for row in 0..size - 2 {
            let index = row * size + col;
            if cells[index] == cells[index + size] && cells[index] == cells[index + size * 2] {
                return true;
            }
        }
    }
    false
}

/// 暴力搜尋第一個能產生三連的交換
///
/// 掃描順序固定：先橫向（列優先），再直向（欄優先）。
/// 回傳的是順序上第一個，不是最佳走法。
pub fn find_first_move<T: PartialEq + Clone>(cells: &[T], size: usize) -> Option<Move> {
    if size == 0 || cells.len() < size * size {
        return None;
    }
    let mut scratch = cells[..size * size].to_vec();

    let horizontal = (0..size).flat_map(|row| {
        (0..size - 1).map(move |col| {
            let from = row * size + col;
            (from, from + 1)
        })
    });
    let vertical = (0..size).flat_map(|col| {
        (0..size - 1).map(move |row| {
            let from = row * size + col;
            (from, from + size)
        })
    });

    for (from, to) in horizontal.chain(vertical) {
        scratch.swap(from, to);
        let found = has_line_of_three(&scratch, size);
        scratch.swap(from, to);
        if found {
            return Some(Move { from, to });
        }
    }
    None
}
