//! grid.rs：
//! - 負責 N×N 棋盤的生成、交換驗證、三連偵測與連鎖消除。
//! - 消除後不做實際掉落，僅就地重新上色；掉落動畫由呈現層自行處理。
//! - 消除結果透過 `GridObserver` 回報，這是能量累積唯一的接入點。
use crate::*;
use log::{debug, error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::Display;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Display)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// 一組三連（或以上），僅在消除流程中短暫存在
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Match {
    pub indices: Vec<CellIndex>,
    pub color: Color,
    pub orientation: Orientation,
}

impl Match {
    pub fn size(&self) -> MatchSize {
        self.indices.len()
    }
}

/// 棋盤事件的接收端
pub trait GridObserver {
    /// 交換被接受、開始消除之前呼叫
    fn on_swap(&mut self, _from: CellIndex, _to: CellIndex) {}

    /// 每一組消除在重新上色之前呼叫
    fn on_match(&mut self, matched: &Match);
}

/// 一次連鎖消除的統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    /// 消除的組數（橫直重疊時分別計算）
    pub matches: usize,
    /// 偵測 → 重新上色 的輪數
    pub steps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// 交換後沒有三連，已還原
    Reverted,
    Resolved(Resolution),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Color>,
    palette: Vec<Color>,
    enabled: bool,
}

impl Grid {
    /// 隨機生成棋盤，保證生成後沒有任何三連
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        palette: Vec<Color>,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        check_size(size)?;
        if palette.is_empty() {
            return Err(GridError::EmptyPalette);
        }

        let cells = (0..size * size)
            .map(|_| random_color(&palette, rng))
            .collect();
        let mut grid = Self {
            size,
            cells,
            palette,
            enabled: true,
        };

        let mut attempts = 0;
        while grid.has_match() {
            if attempts >= MAX_GENERATION_ATTEMPTS {
                return Err(GridError::GenerationFailed { attempts });
            }
            attempts += 1;
            grid.shuffle(rng);
        }
        debug!("棋盤 {size}x{size} 生成完成，洗牌 {attempts} 次");
        Ok(grid)
    }

    /// 以指定內容建立棋盤（允許已有三連，用於測試與讀檔）
    pub fn from_cells(
        size: usize,
        cells: Vec<Color>,
        palette: Vec<Color>,
    ) -> Result<Self, GridError> {
        check_size(size)?;
        if palette.is_empty() {
            return Err(GridError::EmptyPalette);
        }
        if cells.len() != size * size {
            return Err(GridError::CellCountMismatch {
                size,
                actual: cells.len(),
            });
        }
        Ok(Self {
            size,
            cells,
            palette,
            enabled: true,
        })
    }

    /// 從 ASCII 格式載入棋盤，調色盤為全部顏色
    ///
    /// 每行以空白分隔的顏色符號，例如：
    /// ```text
    /// R B G
    /// B G R
    /// G R B
    /// ```
    pub fn from_ascii(ascii: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = ascii
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        let mut cells = Vec::new();
        for row in &rows {
            for symbol in row.split_whitespace() {
                let mut chars = symbol.chars();
                let color = match (chars.next(), chars.next()) {
                    (Some(c), None) => Color::from_symbol(c),
                    _ => None,
                }
                .ok_or_else(|| GridError::UnknownSymbol {
                    symbol: symbol.to_string(),
                })?;
                cells.push(color);
            }
        }

        Self::from_cells(rows.len(), cells, Color::iter().collect())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 扁平化的棋盤內容（列優先）
    pub fn cells(&self) -> &[Color] {
        &self.cells
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn get(&self, index: CellIndex) -> Option<Color> {
        self.cells.get(index).copied()
    }

    /// (row, col)
    pub fn row_col(&self, index: CellIndex) -> (usize, usize) {
        (index / self.size, index % self.size)
    }

    /// 同列相差一欄，或同欄相差一列；斜角永遠不相鄰
    pub fn is_adjacent(&self, a: CellIndex, b: CellIndex) -> bool {
        if a >= self.len() || b >= self.len() {
            return false;
        }
        let (row_a, col_a) = self.row_col(a);
        let (row_b, col_b) = self.row_col(b);
        (row_a == row_b && col_a.abs_diff(col_b) == 1)
            || (col_a == col_b && row_a.abs_diff(row_b) == 1)
    }

    pub fn has_match(&self) -> bool {
        has_line_of_three(&self.cells, self.size)
    }

    /// 找出所有三連：先逐列由左至右，再逐欄由上至下
    ///
    /// 同一格可同時屬於一組橫向與一組直向消除，兩者都會被記錄。
    pub fn find_match_groups(&self) -> Vec<Match> {
        let mut matches = Vec::new();
        for row in 0..self.size {
            let line: Vec<CellIndex> = (0..self.size).map(|col| row * self.size + col).collect();
            self.collect_runs(&line, Orientation::Horizontal, &mut matches);
        }
        for col in 0..self.size {
            let line: Vec<CellIndex> = (0..self.size).map(|row| row * self.size + col).collect();
            self.collect_runs(&line, Orientation::Vertical, &mut matches);
        }
        matches
    }

    fn collect_runs(&self, line: &[CellIndex], orientation: Orientation, out: &mut Vec<Match>) {
        let mut start = 0;
        for end in 1..=line.len() {
            if end < line.len() && self.cells[line[end]] == self.cells[line[start]] {
                continue;
            }
            // 連續段在 end 結束（換色或到底）
            if end - start >= MIN_MATCH {
                out.push(Match {
                    indices: line[start..end].to_vec(),
                    color: self.cells[line[start]],
                    orientation,
                });
            }
            start = end;
        }
    }

    /// 交換兩格並處理消除
    ///
    /// 鎖定、越界或不相鄰時直接拒絕，棋盤與觀察者都不受影響；
    /// 交換後沒有三連則還原，同樣不通知觀察者。
    pub fn swap<R: Rng + ?Sized, O: GridObserver + ?Sized>(
        &mut self,
        from: CellIndex,
        to: CellIndex,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<SwapOutcome, GridError> {
        if !self.enabled {
            return Err(GridError::Locked);
        }
        let len = self.len();
        for index in [from, to] {
            if index >= len {
                return Err(GridError::OutOfBounds { index, len });
            }
        }
        if !self.is_adjacent(from, to) {
            return Err(GridError::NotAdjacent { from, to });
        }

        self.cells.swap(from, to);
        if !self.has_match() {
            self.cells.swap(from, to);
            debug!("交換 {from} <-> {to} 沒有三連，已還原");
            return Ok(SwapOutcome::Reverted);
        }

        observer.on_swap(from, to);
        let resolution = self.process_matches(rng, observer)?;
        Ok(SwapOutcome::Resolved(resolution))
    }

    /// 反覆消除直到棋盤穩定
    ///
    /// 每輪對所有消除組先通知觀察者，再把該組的格子重新上色；
    /// 超過 `MAX_CASCADE_STEPS` 輪回傳 `CascadeOverflow`。
    pub fn process_matches<R: Rng + ?Sized, O: GridObserver + ?Sized>(
        &mut self,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<Resolution, GridError> {
        let mut resolution = Resolution::default();
        loop {
            let groups = self.find_match_groups();
            if groups.is_empty() {
                break;
            }
            if resolution.steps >= MAX_CASCADE_STEPS {
                error!(
                    "連鎖消除超過 {MAX_CASCADE_STEPS} 步仍未穩定，調色盤 {:?}",
                    self.palette
                );
                return Err(GridError::CascadeOverflow {
                    limit: MAX_CASCADE_STEPS,
                });
            }
            resolution.steps += 1;

            for group in &groups {
                debug!(
                    "第 {} 輪消除：{} x{} ({})",
                    resolution.steps,
                    group.color,
                    group.size(),
                    group.orientation
                );
                observer.on_match(group);
                for &index in &group.indices {
                    self.cells[index] = random_color(&self.palette, rng);
                }
            }
            resolution.matches += groups.len();
        }
        Ok(resolution)
    }

    /// 全部格子重新抽色
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in self.cells.iter_mut() {
            *cell = random_color(&self.palette, rng);
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 以 ASCII 輸出，格式與 `from_ascii` 相同
    pub fn to_ascii(&self) -> String {
        self.cells
            .chunks(self.size)
            .map(|row| {
                row.iter()
                    .map(|c| c.symbol().to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn check_size(size: usize) -> Result<(), GridError> {
    if size < MIN_MATCH {
        return Err(GridError::InvalidSize {
            size,
            min: MIN_MATCH,
        });
    }
    Ok(())
}
