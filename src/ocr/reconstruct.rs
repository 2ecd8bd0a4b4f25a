//! Turning recognized words back into positioned text blocks and tables.

use super::{Preprocessed, RawToken};
use crate::bidi::{detect_direction, dominant_direction, script_language};
use crate::extract::ExtractOptions;
use crate::model::{Block, BoundingBox, Direction, PositionHint, PositionedText, Table};

/// Shortest run of dark pixels taken as a rule, as a fraction of the page
/// side it runs along.
const MIN_RULE_FRACTION: f64 = 0.2;

/// Rules shorter than this many pixels are ignored on small pages.
const MIN_RULE_PIXELS: u32 = 20;

/// Ruled table found on a page, as pixel positions of its rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Horizontal rules, top to bottom
    pub rows: Vec<u32>,
    /// Vertical rules, left to right
    pub columns: Vec<u32>,
}

impl Grid {
    /// Row and column of the cell holding a point.
    pub fn cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let between = |rules: &[u32], v: f64| rules.windows(2).position(|w| w[0] as f64 <= v && v < w[1] as f64);
        Some((between(&self.rows, y)?, between(&self.columns, x)?))
    }

    fn bbox(&self) -> BoundingBox {
        let first = |rules: &[u32]| rules.first().copied().unwrap_or(0) as f64;
        let last = |rules: &[u32]| rules.last().copied().unwrap_or(0) as f64;
        BoundingBox::new(
            first(&self.columns),
            first(&self.rows),
            last(&self.columns) - first(&self.columns),
            last(&self.rows) - first(&self.rows),
        )
    }
}

/// Find horizontal and vertical rules on a binarized page.
///
/// A rule is a run of dark pixels at least a fifth of the page side long;
/// adjacent rule lines collapse into one. Two rules in each direction make
/// a grid.
pub fn detect_grid(page: &Preprocessed) -> Option<Grid> {
    let image = page.image();
    let (width, height) = image.dimensions();
    let dark = |x: u32, y: u32| image.get_pixel(x, y)[0] == 0;

    let min_h = min_rule(width);
    let min_v = min_rule(height);
    let rows = merge_adjacent((0..height).filter(|&y| longest_run((0..width).map(|x| dark(x, y))) >= min_h));
    let columns = merge_adjacent((0..width).filter(|&x| longest_run((0..height).map(|y| dark(x, y))) >= min_v));

    (rows.len() >= 2 && columns.len() >= 2).then_some(Grid { rows, columns })
}

fn min_rule(side: u32) -> u32 {
    ((side as f64 * MIN_RULE_FRACTION) as u32).max(MIN_RULE_PIXELS)
}

fn longest_run(pixels: impl Iterator<Item = bool>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    for dark in pixels {
        if dark {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

/// Collapse runs of consecutive positions into their midpoints.
fn merge_adjacent(positions: impl Iterator<Item = u32>) -> Vec<u32> {
    let mut merged = Vec::new();
    let mut current: Option<(u32, u32)> = None;
    for p in positions {
        current = match current {
            Some((start, end)) if p == end + 1 => Some((start, p)),
            Some((start, end)) => {
                merged.push((start + end) / 2);
                Some((p, p))
            }
            None => Some((p, p)),
        };
    }
    if let Some((start, end)) = current {
        merged.push((start + end) / 2);
    }
    merged
}

/// Rebuild one recognized page.
///
/// Words inside a ruled grid become a table, the rest positioned text
/// blocks. Blocks keep top-to-bottom order, with the table placed by its
/// top rule.
pub fn reconstruct_page(tokens: &[RawToken], page: &Preprocessed, options: &ExtractOptions) -> Vec<Block> {
    let (width, height) = (page.width(), page.height());
    let grid = detect_grid(page);
    let (inside, outside): (Vec<RawToken>, Vec<RawToken>) = tokens.iter().cloned().partition(|t| {
        grid.as_ref()
            .is_some_and(|g| g.cell(t.bbox.center_x(), t.bbox.center_y()).is_some())
    });

    let mut blocks: Vec<Block> = reconstruct(&outside, width, height, options)
        .into_iter()
        .map(Block::from)
        .collect();
    let table = grid.and_then(|g| build_table(&inside, &g, options).map(|t| (t, g)));
    if let Some((mut table, grid)) = table {
        let bbox = grid.bbox().normalized(width as f64, height as f64);
        let at = blocks
            .iter()
            .position(|b| match b {
                Block::PositionedText(p) => p.bbox.y >= bbox.y,
                _ => false,
            })
            .unwrap_or(blocks.len());
        table.position = Some(PositionHint::order(0).with_bbox(bbox));
        log::debug!("ruled table with {} rows found on {}x{} page", table.row_count(), width, height);
        blocks.insert(at, table.into());
    }

    for (order, block) in blocks.iter_mut().enumerate() {
        let order = order as u32;
        match block {
            Block::PositionedText(p) => p.position = Some(PositionHint { order, ..p.position.unwrap_or_default() }),
            Block::Table(t) => t.position = Some(PositionHint { order, ..t.position.unwrap_or_default() }),
            _ => {}
        }
    }
    blocks
}

/// Place words into grid cells; empty rows and columns are dropped.
fn build_table(tokens: &[RawToken], grid: &Grid, options: &ExtractOptions) -> Option<Table> {
    let row_count = grid.rows.len() - 1;
    let column_count = grid.columns.len() - 1;
    let mut cells: Vec<Vec<Vec<&RawToken>>> = vec![vec![Vec::new(); column_count]; row_count];
    for token in tokens.iter().filter(|t| !t.text.trim().is_empty()) {
        if let Some((row, column)) = grid.cell(token.bbox.center_x(), token.bbox.center_y()) {
            cells[row][column].push(token);
        }
    }

    let used_columns: Vec<usize> = (0..column_count)
        .filter(|&c| cells.iter().any(|row| !row[c].is_empty()))
        .collect();
    let mut rows: Vec<Vec<String>> = cells
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|mut row| {
            used_columns
                .iter()
                .map(|&c| cell_text(&mut row[c], options))
                .collect()
        })
        .collect();
    if rows.is_empty() {
        return None;
    }

    let direction = dominant_direction(rows.iter().flatten().map(String::as_str));
    if direction == Direction::Rtl {
        for row in &mut rows {
            row.reverse();
        }
    }
    let header_rows = usize::from(rows.len() > 1);
    Some(Table::new(rows).with_header_rows(header_rows).with_direction(direction))
}

/// Text of one cell, line by line in logical order.
fn cell_text(tokens: &mut [&RawToken], options: &ExtractOptions) -> String {
    tokens.sort_by(|a, b| a.bbox.center_y().total_cmp(&b.bbox.center_y()));
    group_lines(tokens, options.line_tolerance)
        .iter()
        .map(|line| join_words(line))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join words of one left-to-right sorted run, rightmost first when the
/// run reads right to left.
fn join_words(group: &[&RawToken]) -> String {
    let words: Vec<&str> = group.iter().map(|t| t.text.trim()).collect();
    if dominant_direction(words.iter().copied()) == Direction::Rtl {
        words.iter().rev().copied().collect::<Vec<_>>().join(" ")
    } else {
        words.join(" ")
    }
}

/// Group tokens into positioned blocks.
///
/// Tokens whose vertical centers lie within `line_tolerance` of the line
/// height share a baseline. Within a line, tokens closer than `gap_factor`
/// times the line height merge into one block. Right-to-left blocks join
/// their words from the rightmost token, so stored text stays in logical
/// order. Bounding boxes are normalized to the page size and blocks below
/// `confidence_floor` are flagged, never dropped.
pub fn reconstruct(
    tokens: &[RawToken],
    width: u32,
    height: u32,
    options: &ExtractOptions,
) -> Vec<PositionedText> {
    let mut tokens: Vec<&RawToken> = tokens.iter().filter(|t| !t.text.trim().is_empty()).collect();
    tokens.sort_by(|a, b| {
        a.bbox
            .center_y()
            .total_cmp(&b.bbox.center_y())
            .then(a.bbox.x.cmp(&b.bbox.x))
    });

    let mut blocks = Vec::new();
    for line in group_lines(&tokens, options.line_tolerance) {
        let line_direction = dominant_direction(line.iter().map(|t| t.text.as_str()));
        let mut groups = split_on_gaps(line, options.gap_factor);
        if line_direction == Direction::Rtl {
            groups.reverse();
        }
        for group in groups {
            let order = blocks.len() as u32;
            blocks.push(build_block(&group, width, height, options).with_position(PositionHint::order(order)));
        }
    }
    blocks
}

/// Split tokens sorted by vertical center into lines.
fn group_lines<'a>(tokens: &[&'a RawToken], tolerance: f64) -> Vec<Vec<&'a RawToken>> {
    let mut lines: Vec<Vec<&RawToken>> = Vec::new();
    let mut center: f64 = 0.0;
    let mut line_height: f64 = 0.0;

    for &token in tokens {
        let token_center = token.bbox.center_y();
        let token_height = token.bbox.height.max(1) as f64;
        match lines.last_mut() {
            Some(line) if (token_center - center).abs() <= tolerance * line_height.max(token_height) => {
                line.push(token);
                let n = line.len() as f64;
                center += (token_center - center) / n;
                line_height = f64::max(line_height, token_height);
            }
            _ => {
                lines.push(vec![token]);
                center = token_center;
                line_height = token_height;
            }
        }
    }

    for line in &mut lines {
        line.sort_by_key(|t| t.bbox.x);
    }
    lines
}

/// Split one line, sorted by x, wherever the horizontal gap is too wide.
fn split_on_gaps(line: Vec<&RawToken>, gap_factor: f64) -> Vec<Vec<&RawToken>> {
    let line_height = line.iter().map(|t| t.bbox.height).max().unwrap_or(1).max(1) as f64;
    let max_gap = gap_factor * line_height;

    let mut groups: Vec<Vec<&RawToken>> = Vec::new();
    for token in line {
        match groups.last_mut() {
            Some(group)
                if group
                    .last()
                    .is_some_and(|prev| (token.bbox.x as f64 - prev.bbox.right() as f64) <= max_gap) =>
            {
                group.push(token);
            }
            _ => groups.push(vec![token]),
        }
    }
    groups
}

fn build_block(group: &[&RawToken], width: u32, height: u32, options: &ExtractOptions) -> PositionedText {
    let text = join_words(group);

    let bbox = group
        .iter()
        .map(|t| t.bbox.to_bbox())
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default()
        .normalized(width as f64, height as f64);
    let confidence = group.iter().map(|t| t.confidence.clamp(0.0, 1.0)).sum::<f64>() / group.len().max(1) as f64;

    let mut block = PositionedText::new(text.clone(), bbox, confidence)
        .with_direction(detect_direction(&text))
        .flag_below(options.confidence_floor);
    if let Some(language) = script_language(&block.text) {
        block = block.with_language(language);
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{preprocess, PixelBox, RawImage};
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn token(text: &str, x: u32, y: u32, w: u32, confidence: f64) -> RawToken {
        RawToken::new(text, PixelBox::new(x, y, w, 20), confidence)
    }

    #[test]
    fn test_same_line_merges() {
        let tokens = vec![
            token("world", 70, 11, 50, 0.9),
            token("Hello", 10, 10, 50, 0.8),
        ];
        let blocks = reconstruct(&tokens, 1000, 500, &ExtractOptions::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Hello world");
        assert_eq!(blocks[0].direction, Direction::Ltr);
        assert_eq!(blocks[0].language.as_deref(), Some("en"));
        assert!((blocks[0].confidence - 0.85).abs() < 1e-9);
        assert!(blocks[0].bbox.is_normalized());
    }

    #[test]
    fn test_wide_gap_splits_block() {
        let tokens = vec![token("left", 10, 10, 40, 0.9), token("right", 600, 10, 50, 0.9)];
        let blocks = reconstruct(&tokens, 1000, 500, &ExtractOptions::default());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "left");
        assert_eq!(blocks[1].position.map(|p| p.order), Some(1));
    }

    #[test]
    fn test_lines_ordered_top_to_bottom() {
        let tokens = vec![token("second", 10, 100, 60, 0.9), token("first", 10, 10, 50, 0.9)];
        let blocks = reconstruct(&tokens, 1000, 500, &ExtractOptions::default());
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn test_rtl_joins_from_right() {
        // "مرحبا" sits to the right of "بكم" on the page.
        let tokens = vec![token("بكم", 100, 10, 40, 0.9), token("مرحبا", 150, 10, 60, 0.9)];
        let blocks = reconstruct(&tokens, 400, 100, &ExtractOptions::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "مرحبا بكم");
        assert_eq!(blocks[0].direction, Direction::Rtl);
        assert_eq!(blocks[0].language.as_deref(), Some("ar"));
    }

    #[test]
    fn test_low_confidence_flagged_not_dropped() {
        let tokens = vec![token("faint", 10, 10, 50, 0.2)];
        let blocks = reconstruct(&tokens, 100, 100, &ExtractOptions::default());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].low_confidence);
    }

    #[test]
    fn test_blank_tokens_ignored() {
        let tokens = vec![token("  ", 10, 10, 50, 0.9)];
        assert!(reconstruct(&tokens, 100, 100, &ExtractOptions::default()).is_empty());
    }

    /// 200x120 page with a 2x2 grid ruled from (10, 20) to (190, 100).
    fn ruled_page(ruled: bool) -> Preprocessed {
        let mut image = GrayImage::from_pixel(200, 120, Luma([255]));
        // ink blots too short to be rules
        for (bx, by) in [(150, 4), (60, 106)] {
            for x in bx..bx + 10 {
                for y in by..by + 10 {
                    image.put_pixel(x, y, Luma([0]));
                }
            }
        }
        if ruled {
            for y in [20, 60, 100] {
                for x in 10..193 {
                    for t in 0..3 {
                        image.put_pixel(x, y + t, Luma([0]));
                    }
                }
            }
            for x in [10, 100, 190] {
                for y in 20..103 {
                    for t in 0..3 {
                        image.put_pixel(x + t, y, Luma([0]));
                    }
                }
            }
        }
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
        preprocess(&RawImage::new(&png)).unwrap()
    }

    #[test]
    fn test_detect_grid() {
        let grid = detect_grid(&ruled_page(true)).unwrap();
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.columns.len(), 3);
        assert_eq!(grid.cell(40.0, 40.0), Some((0, 0)));
        assert_eq!(grid.cell(150.0, 80.0), Some((1, 1)));
        assert_eq!(grid.cell(40.0, 5.0), None);

        assert!(detect_grid(&ruled_page(false)).is_none());
    }

    #[test]
    fn test_words_in_grid_become_table() {
        let tokens = vec![
            token("Inventory", 20, 0, 60, 0.9),
            token("Name", 20, 30, 40, 0.9),
            token("Qty", 110, 30, 30, 0.9),
            token("apple", 20, 70, 40, 0.9),
            token("3", 110, 70, 10, 0.9),
            token("End", 20, 100, 30, 0.9),
        ];
        let blocks = reconstruct_page(&tokens, &ruled_page(true), &ExtractOptions::default());
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], Block::PositionedText(p) if p.text == "Inventory"));
        match &blocks[1] {
            Block::Table(table) => {
                assert_eq!(table.rows, vec![vec!["Name", "Qty"], vec!["apple", "3"]]);
                assert_eq!(table.header_rows, 1);
                let position = table.position.unwrap();
                assert_eq!(position.order, 1);
                assert!(position.bbox.unwrap().is_normalized());
            }
            other => panic!("expected table, got {:?}", other),
        }
        assert!(matches!(&blocks[2], Block::PositionedText(p) if p.text == "End"));
        assert_eq!(blocks[2].position().map(|p| p.order), Some(2));
    }

    #[test]
    fn test_rtl_table_columns_in_logical_order() {
        let tokens = vec![
            token("العدد", 20, 30, 40, 0.9),
            token("الاسم", 110, 30, 40, 0.9),
            token("ثلاثة", 20, 70, 40, 0.9),
            token("تفاح", 110, 70, 40, 0.9),
        ];
        let blocks = reconstruct_page(&tokens, &ruled_page(true), &ExtractOptions::default());
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Table(table) => {
                assert_eq!(table.direction, Direction::Rtl);
                assert_eq!(table.rows[0], ["الاسم", "العدد"]);
                assert_eq!(table.rows[1], ["تفاح", "ثلاثة"]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_unruled_page_has_no_table() {
        let tokens = vec![token("Name", 20, 30, 40, 0.9), token("Qty", 110, 30, 30, 0.9)];
        let blocks = reconstruct_page(&tokens, &ruled_page(false), &ExtractOptions::default());
        assert!(blocks.iter().all(|b| matches!(b, Block::PositionedText(_))));
    }
}
