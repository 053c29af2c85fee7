//! Query builder argument and ordering types.

/// A positional WHERE argument.
///
/// Built at the call boundary through the `From` impls or the [`args!`]
/// macro, so every value the builder sees has a known rendering.
///
/// [`args!`]: crate::args
#[derive(Debug, Clone, PartialEq)]
pub enum QueryArg {
    /// Signed integer, rendered as a bare numeral
    Int(i64),
    /// Unsigned integer, rendered as a bare numeral
    Uint(u64),
    /// Float, rendered in shortest plain decimal form
    Float(f64),
    /// Text, double-quoted unless it starts with a temporal keyword
    Text(String),
    /// Bytes, treated as (lossy) UTF-8 text and always double-quoted
    Bytes(Vec<u8>),
    /// Boolean, rendered as `true` / `false`
    Bool(bool),
}

macro_rules! impl_from_arg {
    ($variant:ident, $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for QueryArg {
                fn from(value: $source) -> Self {
                    QueryArg::$variant(value as $target)
                }
            }
        )*
    };
}

impl_from_arg!(Int, i64: i8, i16, i32, i64, isize);
impl_from_arg!(Uint, u64: u8, u16, u32, u64, usize);
impl_from_arg!(Float, f64: f32, f64);

impl From<bool> for QueryArg {
    fn from(value: bool) -> Self {
        QueryArg::Bool(value)
    }
}

impl From<String> for QueryArg {
    fn from(value: String) -> Self {
        QueryArg::Text(value)
    }
}

impl From<&str> for QueryArg {
    fn from(value: &str) -> Self {
        QueryArg::Text(value.to_string())
    }
}

impl From<&String> for QueryArg {
    fn from(value: &String) -> Self {
        QueryArg::Text(value.clone())
    }
}

impl From<Vec<u8>> for QueryArg {
    fn from(value: Vec<u8>) -> Self {
        QueryArg::Bytes(value)
    }
}

impl From<&[u8]> for QueryArg {
    fn from(value: &[u8]) -> Self {
        QueryArg::Bytes(value.to_vec())
    }
}

/// Build a `Vec<QueryArg>` from mixed values: `args![18, "alice", true]`.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::query::QueryArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::query::QueryArg::from($arg)),+]
    };
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderBy {
    #[default]
    Asc,
    Desc,
}

impl OrderBy {
    /// Returns the dialect keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

/// Ordering for one logical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrderBy {
    pub column: String,
    pub order: OrderBy,
}

impl ColumnOrderBy {
    pub fn new(column: impl Into<String>, order: OrderBy) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, OrderBy::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, OrderBy::Desc)
    }
}
