//! In-memory spreadsheet backend for integration tests.
//!
//! `FakeSheets` keeps per-sheet cell maps and evaluates the handful of
//! formulas and query clauses the stores emit: `=ROW()`, `VLOOKUP`,
//! `VLOOKUP(SORT(..))`, `MATCH`, `JOIN(QUERY(..))` and
//! `select .. where .. order by .. offset .. limit`.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;
use tabula_common::{
    cell_to_col_idx, generate_column_name, AppendMode, BatchUpdateRowsRequest, CellRange,
    InsertRowsResult, QueryRowsResult, Result, Rows, SheetOperations, TabulaError,
    UpdateRowsResult,
};

const MAX_COLS: usize = 26;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Stored cell content
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Formula(String),
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateSheet(String),
    DeleteSheets(Vec<i64>),
    SheetNameToId,
    InsertRows {
        range: String,
        rows: usize,
        mode: AppendMode,
    },
    UpdateRows {
        range: String,
    },
    BatchUpdateRows {
        ranges: Vec<String>,
    },
    QueryRows {
        sheet: String,
        query: String,
    },
    Clear {
        ranges: Vec<String>,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateSheet(_) => "create_sheet",
            Call::DeleteSheets(_) => "delete_sheets",
            Call::SheetNameToId => "sheet_name_to_id",
            Call::InsertRows { .. } => "insert_rows",
            Call::UpdateRows { .. } => "update_rows",
            Call::BatchUpdateRows { .. } => "batch_update_rows",
            Call::QueryRows { .. } => "query_rows",
            Call::Clear { .. } => "clear",
        }
    }
}

#[derive(Debug, Default)]
struct Sheet {
    id: i64,
    cells: BTreeMap<(u64, usize), Cell>,
}

impl Sheet {
    fn max_row(&self) -> u64 {
        self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct State {
    sheets: BTreeMap<String, Sheet>,
    next_sheet_id: i64,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
}

#[derive(Debug, Default)]
pub struct FakeSheets {
    state: Mutex<State>,
}

enum Write {
    Keep,
    Clear,
    Set(Cell),
}

impl FakeSheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to `op` (e.g. `"update_rows"`) fail
    pub fn fail(&self, op: &'static str) {
        self.state.lock().failing.insert(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn calls_named(&self, op: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.name() == op).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.state.lock().sheets.keys().cloned().collect()
    }

    /// Evaluated value of `cell` (e.g. `"B3"`), `None` when empty
    pub fn cell(&self, sheet: &str, cell: &str) -> Option<Value> {
        let (row, col) = parse_cell(cell);
        eval_cell(&self.state.lock(), sheet, row, col)
    }

    pub fn raw_cell(&self, sheet: &str, cell: &str) -> Option<Cell> {
        let (row, col) = parse_cell(cell);
        self.state
            .lock()
            .sheets
            .get(sheet)
            .and_then(|s| s.cells.get(&(row, col)).cloned())
    }

    /// Write `value` with user-entered semantics, creating the sheet if needed
    pub fn set_cell(&self, sheet: &str, cell: &str, value: Value) {
        let (row, col) = parse_cell(cell);
        let mut state = self.state.lock();
        if !state.sheets.contains_key(sheet) {
            add_sheet(&mut state, sheet);
        }
        if let Some(sheet) = state.sheets.get_mut(sheet) {
            write_cell(sheet, row, col, &value);
        }
    }

    /// Rows of `sheet` with at least one non-empty cell
    pub fn occupied_rows(&self, sheet: &str) -> Vec<u64> {
        let state = self.state.lock();
        let mut rows: Vec<u64> = state
            .sheets
            .get(sheet)
            .map(|s| s.cells.keys().map(|(r, _)| *r).collect())
            .unwrap_or_default();
        rows.dedup();
        rows
    }

    fn begin(&self, call: Call) -> Result<parking_lot::MutexGuard<'_, State>> {
        let mut state = self.state.lock();
        let name = call.name();
        state.calls.push(call);
        if state.failing.contains(name) {
            return Err(TabulaError::Backend(format!("injected failure in {}", name)));
        }
        Ok(state)
    }
}

fn add_sheet(state: &mut State, name: &str) -> i64 {
    state.next_sheet_id += 1;
    let id = state.next_sheet_id;
    state.sheets.insert(
        name.to_string(),
        Sheet {
            id,
            cells: BTreeMap::new(),
        },
    );
    id
}

fn sheet_mut<'a>(state: &'a mut State, name: &str) -> Result<&'a mut Sheet> {
    state
        .sheets
        .get_mut(name)
        .ok_or_else(|| TabulaError::Backend(format!("Unable to parse range: {}", name)))
}

fn parse_cell(cell: &str) -> (u64, usize) {
    let col = cell_to_col_idx(cell).max(1);
    let row = cell
        .find(|c: char| c.is_ascii_digit())
        .and_then(|idx| cell[idx..].parse().ok())
        .unwrap_or(1);
    (row, col)
}

fn user_entered(value: &Value) -> Write {
    match value {
        Value::Null => Write::Keep,
        Value::Bool(b) => Write::Set(Cell::Bool(*b)),
        Value::Number(n) => Write::Set(Cell::Number(n.as_f64().unwrap_or_default())),
        Value::String(s) => {
            if let Some(literal) = s.strip_prefix('\'') {
                if literal.is_empty() {
                    Write::Clear
                } else {
                    Write::Set(Cell::Text(literal.to_string()))
                }
            } else if s.is_empty() {
                Write::Clear
            } else if s.starts_with('=') {
                Write::Set(Cell::Formula(s.clone()))
            } else if let Ok(n) = s.trim().parse::<f64>() {
                Write::Set(Cell::Number(n))
            } else if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
                Write::Set(Cell::Bool(s.eq_ignore_ascii_case("true")))
            } else {
                Write::Set(Cell::Text(s.clone()))
            }
        }
        other => Write::Set(Cell::Text(other.to_string())),
    }
}

fn write_cell(sheet: &mut Sheet, row: u64, col: usize, value: &Value) {
    match user_entered(value) {
        Write::Keep => {}
        Write::Clear => {
            sheet.cells.remove(&(row, col));
        }
        Write::Set(cell) => {
            sheet.cells.insert((row, col), cell);
        }
    }
}

fn eval_cell(state: &State, sheet: &str, row: u64, col: usize) -> Option<Value> {
    let cell = state.sheets.get(sheet)?.cells.get(&(row, col))?;
    match cell {
        Cell::Text(s) => Some(Value::from(s.clone())),
        Cell::Number(n) => Some(Value::from(*n)),
        Cell::Bool(b) => Some(Value::from(*b)),
        Cell::Formula(f) => Some(eval_formula(state, f, row)),
    }
}

/// Formatted rendering, as a formatted-value read would show it
fn formatted(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            let f = n.as_f64().unwrap_or_default();
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", f as i64)
            } else {
                f.to_string()
            }
        }
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

struct Formulas {
    vlookup: Regex,
    vlookup_sorted: Regex,
    matcher: Regex,
    join_query: Regex,
}

fn formulas() -> &'static Formulas {
    static FORMULAS: OnceLock<Formulas> = OnceLock::new();
    FORMULAS.get_or_init(|| {
        let string = r#""((?:[^"]|"")*)""#;
        let range = r#"'((?:[^']|'')*)'!([A-Z]+)(\d*):([A-Z]+)(\d*)"#;
        let build = |pattern: String| Regex::new(&pattern).expect("valid regex");
        Formulas {
            vlookup: build(format!(r"^=VLOOKUP\({}, {}, 2, FALSE\)$", string, range)),
            vlookup_sorted: build(format!(
                r"^=VLOOKUP\({}, SORT\({}, 3, FALSE\), 2, FALSE\)$",
                string, range
            )),
            matcher: build(format!(r"^=MATCH\({}, {}, 0\)$", string, range)),
            join_query: build(format!(r#"^=JOIN\(",", QUERY\({}, {}, 0\)\)$"#, range, string)),
        }
    })
}

fn unquote(s: &str, quote: &str) -> String {
    s.replace(&format!("{}{}", quote, quote), quote)
}

fn first_row(caps: &regex::Captures<'_>, idx: usize) -> u64 {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

fn na() -> Value {
    Value::from("#N/A")
}

fn eval_formula(state: &State, formula: &str, row: u64) -> Value {
    if formula == "=ROW()" {
        return Value::from(row as f64);
    }

    let f = formulas();
    if let Some(caps) = f.vlookup.captures(formula) {
        let key = unquote(&caps[1], "\"");
        let sheet = unquote(&caps[2], "'");
        let start = first_row(&caps, 4);
        return vlookup(state, &sheet, &key, start, false);
    }
    if let Some(caps) = f.vlookup_sorted.captures(formula) {
        let key = unquote(&caps[1], "\"");
        let sheet = unquote(&caps[2], "'");
        let start = first_row(&caps, 4);
        return vlookup(state, &sheet, &key, start, true);
    }
    if let Some(caps) = f.matcher.captures(formula) {
        let key = unquote(&caps[1], "\"");
        let sheet = unquote(&caps[2], "'");
        let start = first_row(&caps, 4);
        let max = state.sheets.get(&sheet).map(Sheet::max_row).unwrap_or(0);
        return (start..=max)
            .find(|&r| {
                eval_cell(state, &sheet, r, 1)
                    .map(|v| formatted(&v) == key)
                    .unwrap_or(false)
            })
            .map(|r| Value::from((r - start + 1) as f64))
            .unwrap_or_else(na);
    }
    if let Some(caps) = f.join_query.captures(formula) {
        let sheet = unquote(&caps[1], "'");
        let start = first_row(&caps, 3);
        let query = unquote(&caps[6], "\"");
        return match run_query(state, &sheet, &query, start) {
            Ok(rows) if rows.is_empty() => na(),
            Ok(rows) => {
                let joined: Vec<String> = rows
                    .iter()
                    .map(|r| r.first().map(formatted).unwrap_or_default())
                    .collect();
                Value::from(joined.join(","))
            }
            Err(_) => Value::from("#VALUE!"),
        };
    }

    Value::from(formula)
}

fn vlookup(state: &State, sheet: &str, key: &str, start: u64, newest_first: bool) -> Value {
    let max = state.sheets.get(sheet).map(Sheet::max_row).unwrap_or(0);
    let mut rows: Vec<u64> = (start..=max).collect();
    if newest_first {
        let ts = |r: u64| {
            eval_cell(state, sheet, r, 3)
                .and_then(|v| v.as_f64())
                .unwrap_or(f64::NEG_INFINITY)
        };
        rows.sort_by(|a, b| ts(*b).partial_cmp(&ts(*a)).unwrap_or(Ordering::Equal));
    }

    rows.into_iter()
        .find(|&r| {
            eval_cell(state, sheet, r, 1)
                .map(|v| formatted(&v) == key)
                .unwrap_or(false)
        })
        .map(|r| eval_cell(state, sheet, r, 2).unwrap_or_else(|| Value::from("")))
        .unwrap_or_else(na)
}

// Query language subset

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Num(f64),
    Op(String),
    Comma,
    LParen,
    RParen,
}

fn tokenize(query: &str) -> std::result::Result<Vec<Tok>, String> {
    let chars: Vec<char> = query.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == ',' {
            tokens.push(Tok::Comma);
            i += 1;
        } else if c == '(' {
            tokens.push(Tok::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Tok::RParen);
            i += 1;
        } else if c == '"' {
            let mut s = String::new();
            i += 1;
            loop {
                let c = *chars.get(i).ok_or("unterminated string")?;
                i += 1;
                match c {
                    '"' => break,
                    '\\' => {
                        let e = *chars.get(i).ok_or("dangling escape")?;
                        i += 1;
                        match e {
                            'n' => s.push('\n'),
                            'r' => s.push('\r'),
                            't' => s.push('\t'),
                            'u' => {
                                let hex: String = chars.get(i..i + 4).ok_or("bad escape")?.iter().collect();
                                i += 4;
                                let code = u32::from_str_radix(&hex, 16).map_err(|e| e.to_string())?;
                                s.push(char::from_u32(code).ok_or("bad code point")?);
                            }
                            other => s.push(other),
                        }
                    }
                    other => s.push(other),
                }
            }
            tokens.push(Tok::Str(s));
        } else if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '+' | '-')) {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Tok::Num(text.parse().map_err(|_| format!("bad number {}", text))?));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Tok::Ident(chars[start..i].iter().collect()));
        } else {
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            if matches!(two.as_str(), "!=" | "<>" | "<=" | ">=") {
                tokens.push(Tok::Op(two));
                i += 2;
            } else if matches!(c, '=' | '<' | '>') {
                tokens.push(Tok::Op(c.to_string()));
                i += 1;
            } else {
                return Err(format!("unexpected character {:?}", c));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug)]
enum SelectItem {
    Column(usize),
    Count(usize),
}

#[derive(Debug)]
enum Cond {
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
    IsNull { col: usize, negated: bool },
    Cmp { col: usize, op: String, literal: Value },
}

#[derive(Debug, Default)]
struct Query {
    select: Vec<SelectItem>,
    condition: Option<Cond>,
    order_by: Vec<(usize, bool)>,
    limit: Option<usize>,
    offset: usize,
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn keyword(&mut self, kw: &str) -> bool {
        match self.peek() {
            Some(Tok::Ident(s)) if s.eq_ignore_ascii_case(kw) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> std::result::Result<(), String> {
        if self.keyword(kw) {
            Ok(())
        } else {
            Err(format!("expected {} at token {}", kw, self.pos))
        }
    }

    fn column(&mut self) -> std::result::Result<usize, String> {
        match self.next() {
            Some(Tok::Ident(s)) if s.chars().all(|c| c.is_ascii_uppercase()) => {
                let col = cell_to_col_idx(&s);
                if col == 0 || col > MAX_COLS {
                    return Err(format!("column out of range: {}", s));
                }
                Ok(col)
            }
            other => Err(format!("expected column, got {:?}", other)),
        }
    }

    fn number(&mut self) -> std::result::Result<usize, String> {
        match self.next() {
            Some(Tok::Num(n)) if n >= 0.0 => Ok(n as usize),
            other => Err(format!("expected number, got {:?}", other)),
        }
    }

    fn parse(mut self) -> std::result::Result<Query, String> {
        let mut query = Query::default();
        self.expect_keyword("select")?;
        loop {
            if self.keyword("count") {
                if self.next() != Some(Tok::LParen) {
                    return Err("expected (".to_string());
                }
                let col = self.column()?;
                if self.next() != Some(Tok::RParen) {
                    return Err("expected )".to_string());
                }
                query.select.push(SelectItem::Count(col));
            } else {
                query.select.push(SelectItem::Column(self.column()?));
            }
            if self.peek() == Some(&Tok::Comma) {
                self.pos += 1;
            } else {
                break;
            }
        }

        if self.keyword("where") {
            query.condition = Some(self.or_expr()?);
        }
        if self.keyword("order") {
            self.expect_keyword("by")?;
            loop {
                let col = self.column()?;
                let desc = if self.keyword("desc") {
                    true
                } else {
                    self.keyword("asc");
                    false
                };
                query.order_by.push((col, desc));
                if self.peek() == Some(&Tok::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        loop {
            if self.keyword("limit") {
                query.limit = Some(self.number()?);
            } else if self.keyword("offset") {
                query.offset = self.number()?;
            } else {
                break;
            }
        }

        match self.peek() {
            None => Ok(query),
            Some(tok) => Err(format!("unexpected token {:?}", tok)),
        }
    }

    fn or_expr(&mut self) -> std::result::Result<Cond, String> {
        let mut left = self.and_expr()?;
        while self.keyword("or") {
            let right = self.and_expr()?;
            left = Cond::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> std::result::Result<Cond, String> {
        let mut left = self.predicate()?;
        while self.keyword("and") {
            let right = self.predicate()?;
            left = Cond::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn predicate(&mut self) -> std::result::Result<Cond, String> {
        if self.peek() == Some(&Tok::LParen) {
            self.pos += 1;
            let inner = self.or_expr()?;
            if self.next() != Some(Tok::RParen) {
                return Err("expected )".to_string());
            }
            return Ok(inner);
        }

        let col = self.column()?;
        if self.keyword("is") {
            let negated = self.keyword("not");
            self.expect_keyword("null")?;
            return Ok(Cond::IsNull { col, negated });
        }

        let op = match self.next() {
            Some(Tok::Op(op)) => op,
            other => return Err(format!("expected operator, got {:?}", other)),
        };
        let literal = match self.next() {
            Some(Tok::Str(s)) => Value::from(s),
            Some(Tok::Num(n)) => Value::from(n),
            Some(Tok::Ident(s)) if s.eq_ignore_ascii_case("true") => Value::from(true),
            Some(Tok::Ident(s)) if s.eq_ignore_ascii_case("false") => Value::from(false),
            other => return Err(format!("expected literal, got {:?}", other)),
        };
        Ok(Cond::Cmp { col, op, literal })
    }
}

fn compare(cell: &Value, literal: &Value) -> Option<Ordering> {
    match (cell, literal) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches(cond: &Cond, record: &[Option<Value>]) -> bool {
    match cond {
        Cond::And(a, b) => matches(a, record) && matches(b, record),
        Cond::Or(a, b) => matches(a, record) || matches(b, record),
        Cond::IsNull { col, negated } => record[col - 1].is_none() != *negated,
        Cond::Cmp { col, op, literal } => {
            let Some(value) = &record[col - 1] else {
                return false;
            };
            let Some(ord) = compare(value, literal) else {
                return false;
            };
            match op.as_str() {
                "=" => ord == Ordering::Equal,
                "!=" | "<>" => ord != Ordering::Equal,
                "<" => ord == Ordering::Less,
                "<=" => ord != Ordering::Greater,
                ">" => ord == Ordering::Greater,
                ">=" => ord != Ordering::Less,
                _ => false,
            }
        }
    }
}

fn rank(value: &Option<Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(_) => 3,
    }
}

fn sort_key_cmp(a: &Option<Value>, b: &Option<Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn run_query(
    state: &State,
    sheet_name: &str,
    query: &str,
    first_row: u64,
) -> std::result::Result<Vec<Vec<Value>>, String> {
    let sheet = state
        .sheets
        .get(sheet_name)
        .ok_or_else(|| format!("no sheet {}", sheet_name))?;
    let query = Parser {
        tokens: tokenize(query)?,
        pos: 0,
    }
    .parse()?;

    let mut records: Vec<Vec<Option<Value>>> = (first_row..=sheet.max_row())
        .map(|r| {
            (1..=MAX_COLS)
                .map(|c| eval_cell(state, sheet_name, r, c))
                .collect()
        })
        .filter(|record: &Vec<Option<Value>>| {
            query
                .condition
                .as_ref()
                .map(|cond| matches(cond, record))
                .unwrap_or(true)
        })
        .collect();

    if query
        .select
        .iter()
        .any(|item| matches!(item, SelectItem::Count(_)))
    {
        let row = query
            .select
            .iter()
            .map(|item| match item {
                SelectItem::Count(col) | SelectItem::Column(col) => Value::from(
                    records.iter().filter(|r| r[col - 1].is_some()).count() as f64,
                ),
            })
            .collect();
        return Ok(vec![row]);
    }

    for (col, desc) in query.order_by.iter().rev() {
        records.sort_by(|a, b| {
            let ord = sort_key_cmp(&a[col - 1], &b[col - 1]);
            if *desc {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    let limit = query.limit.unwrap_or(usize::MAX);
    Ok(records
        .into_iter()
        .skip(query.offset)
        .take(limit)
        .map(|record| {
            query
                .select
                .iter()
                .map(|item| match item {
                    SelectItem::Column(col) | SelectItem::Count(col) => {
                        record[col - 1].clone().unwrap_or(Value::Null)
                    }
                })
                .collect()
        })
        .collect())
}

fn range_bounds(range: &CellRange, max_row: u64) -> (u64, u64, usize, usize) {
    let from_col = cell_to_col_idx(&range.from_cell).max(1);
    let to_col = match cell_to_col_idx(&range.to_cell) {
        0 => MAX_COLS,
        c => c,
    };
    let from_row = range.first_row().unwrap_or(1);
    let to_row = range
        .to_cell
        .find(|c: char| c.is_ascii_digit())
        .and_then(|idx| range.to_cell[idx..].parse().ok())
        .unwrap_or(max_row);
    (from_row, to_row, from_col, to_col)
}

fn a1(sheet: &str, from_row: u64, from_col: usize, rows: usize, cols: usize) -> String {
    let first = format!("{}{}", generate_column_name(from_col - 1), from_row);
    if rows <= 1 && cols <= 1 {
        return format!("{}!{}", sheet, first);
    }
    format!(
        "{}!{}:{}{}",
        sheet,
        first,
        generate_column_name(from_col + cols.max(1) - 2),
        from_row + rows.max(1) as u64 - 1
    )
}

fn apply_update(state: &mut State, range: &CellRange, values: &Rows) -> Result<UpdateRowsResult> {
    let (row, col) = parse_cell(&range.from_cell);
    let sheet = sheet_mut(state, &range.sheet_name)?;
    for (i, values) in values.iter().enumerate() {
        for (j, value) in values.iter().enumerate() {
            write_cell(sheet, row + i as u64, col + j, value);
        }
    }

    let state: &State = state;
    let updated_values: Rows = values
        .iter()
        .enumerate()
        .map(|(i, vs)| {
            (0..vs.len())
                .map(|j| {
                    Value::from(
                        eval_cell(state, &range.sheet_name, row + i as u64, col + j)
                            .map(|v| formatted(&v))
                            .unwrap_or_default(),
                    )
                })
                .collect()
        })
        .collect();

    let cols = values.iter().map(Vec::len).max().unwrap_or(0);
    Ok(UpdateRowsResult {
        updated_range: range.clone(),
        updated_rows: values.len() as i64,
        updated_columns: cols as i64,
        updated_cells: values.iter().map(Vec::len).sum::<usize>() as i64,
        updated_values,
    })
}

#[async_trait]
impl SheetOperations for FakeSheets {
    async fn create_sheet(&self, _spreadsheet_id: &str, sheet_name: &str) -> Result<()> {
        let mut state = self.begin(Call::CreateSheet(sheet_name.to_string()))?;
        if state.sheets.contains_key(sheet_name) {
            return Err(TabulaError::Backend(format!(
                "A sheet with the name \"{}\" already exists",
                sheet_name
            )));
        }
        add_sheet(&mut state, sheet_name);
        Ok(())
    }

    async fn delete_sheets(&self, _spreadsheet_id: &str, sheet_ids: &[i64]) -> Result<()> {
        let mut state = self.begin(Call::DeleteSheets(sheet_ids.to_vec()))?;
        state.sheets.retain(|_, sheet| !sheet_ids.contains(&sheet.id));
        Ok(())
    }

    async fn sheet_name_to_id(&self, _spreadsheet_id: &str) -> Result<HashMap<String, i64>> {
        let state = self.begin(Call::SheetNameToId)?;
        Ok(state
            .sheets
            .iter()
            .map(|(name, sheet)| (name.clone(), sheet.id))
            .collect())
    }

    async fn insert_rows(
        &self,
        _spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
        mode: AppendMode,
    ) -> Result<InsertRowsResult> {
        let mut state = self.begin(Call::InsertRows {
            range: range.to_string(),
            rows: values.len(),
            mode,
        })?;
        let sheet = sheet_mut(&mut state, &range.sheet_name)?;
        let (start, _, from_col, to_col) = range_bounds(range, sheet.max_row());

        let last = sheet
            .cells
            .keys()
            .filter(|(r, c)| *r >= start && *c >= from_col && *c <= to_col)
            .map(|(r, _)| *r)
            .max();
        let target = last.map(|r| r + 1).unwrap_or(start);

        for (i, row) in values.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                write_cell(sheet, target + i as u64, from_col + j, value);
            }
        }

        let cols = values.iter().map(Vec::len).max().unwrap_or(0);
        Ok(InsertRowsResult {
            updated_range: CellRange::parse(&a1(
                &range.sheet_name,
                target,
                from_col,
                values.len(),
                cols,
            )),
            updated_rows: values.len() as i64,
            updated_columns: cols as i64,
            updated_cells: values.iter().map(Vec::len).sum::<usize>() as i64,
            inserted_values: values,
        })
    }

    async fn update_rows(
        &self,
        _spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
    ) -> Result<UpdateRowsResult> {
        let mut state = self.begin(Call::UpdateRows {
            range: range.to_string(),
        })?;
        apply_update(&mut state, range, &values)
    }

    async fn batch_update_rows(
        &self,
        _spreadsheet_id: &str,
        requests: Vec<BatchUpdateRowsRequest>,
    ) -> Result<Vec<UpdateRowsResult>> {
        let mut state = self.begin(Call::BatchUpdateRows {
            ranges: requests.iter().map(|r| r.range.to_string()).collect(),
        })?;
        requests
            .iter()
            .map(|req| apply_update(&mut state, &req.range, &req.values))
            .collect()
    }

    async fn query_rows(
        &self,
        _spreadsheet_id: &str,
        sheet_name: &str,
        query: &str,
        skip_header: bool,
    ) -> Result<QueryRowsResult> {
        let state = self.begin(Call::QueryRows {
            sheet: sheet_name.to_string(),
            query: query.to_string(),
        })?;
        let first_row = if skip_header { 2 } else { 1 };
        let rows = run_query(&state, sheet_name, query, first_row)
            .map_err(|e| TabulaError::Backend(format!("query failed: {}", e)))?;
        Ok(QueryRowsResult { rows })
    }

    async fn clear(&self, _spreadsheet_id: &str, ranges: &[CellRange]) -> Result<Vec<String>> {
        let mut state = self.begin(Call::Clear {
            ranges: ranges.iter().map(CellRange::to_string).collect(),
        })?;
        for range in ranges {
            let sheet = sheet_mut(&mut state, &range.sheet_name)?;
            let (from_row, to_row, from_col, to_col) = range_bounds(range, sheet.max_row());
            sheet.cells.retain(|(r, c), _| {
                !(*r >= from_row && *r <= to_row && *c >= from_col && *c <= to_col)
            });
        }
        Ok(ranges.iter().map(CellRange::to_string).collect())
    }
}
