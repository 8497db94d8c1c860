//! Symbolic scalar expressions over time, coordinates and other curves.
//!
//! Expressions stay a tree until export; [`Expr`]'s `Display` impl renders the
//! solver's infix syntax with the minimum parentheses needed to keep
//! precedence intact.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,
    /// `1` when `lhs >= rhs`, else `0`.
    Ge,
    /// `1` when `lhs < rhs`, else `0`.
    Lt,
}

impl BinOp {
    fn precedence(self) -> u8 {
        match self {
            BinOp::Ge | BinOp::Lt => 1,
            BinOp::Add | BinOp::Sub => 2,
            BinOp::Mul | BinOp::Div => 3,
            BinOp::Pow => 4,
            BinOp::Min | BinOp::Max => ATOM,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
            BinOp::Min => "min",
            BinOp::Max => "max",
            BinOp::Ge => ">=",
            BinOp::Lt => "<",
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        let flag = |c: bool| if c { 1.0 } else { 0.0 };
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
            BinOp::Min => a.min(b),
            BinOp::Max => a.max(b),
            BinOp::Ge => flag(a >= b),
            BinOp::Lt => flag(a < b),
        }
    }
}

const ATOM: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    /// Simulation time `t`.
    Time,
    /// One component (1-based) of a coordinate field variable.
    Coord { variable: String, component: u8 },
    /// Value of another named boundary curve.
    Curve(String),
    Sin(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// n-ary sum; renders as `0` when empty.
    Sum(Vec<Expr>),
}

/// Bindings used by [`Expr::evaluate`].
#[derive(Debug, Clone, Default)]
pub struct EvalEnv {
    pub time: f64,
    pub coords: BTreeMap<(String, u8), f64>,
    pub curves: BTreeMap<String, f64>,
}

impl EvalEnv {
    pub fn at(time: f64) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    pub fn with_coord(mut self, variable: &str, component: u8, value: f64) -> Self {
        self.coords.insert((variable.to_string(), component), value);
        self
    }

    pub fn with_curve(mut self, name: &str, value: f64) -> Self {
        self.curves.insert(name.to_string(), value);
        self
    }
}

impl Expr {
    pub fn num(v: f64) -> Self {
        Expr::Num(v)
    }

    pub fn time() -> Self {
        Expr::Time
    }

    pub fn coord(variable: impl Into<String>, component: u8) -> Self {
        Expr::Coord {
            variable: variable.into(),
            component,
        }
    }

    pub fn curve(name: impl Into<String>) -> Self {
        Expr::Curve(name.into())
    }

    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn sin(self) -> Self {
        Expr::Sin(Box::new(self))
    }

    pub fn pow(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Pow, self, rhs)
    }

    pub fn min(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Min, self, rhs)
    }

    pub fn max(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Max, self, rhs)
    }

    pub fn ge(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Ge, self, rhs)
    }

    pub fn lt(self, rhs: Expr) -> Self {
        Self::binary(BinOp::Lt, self, rhs)
    }

    /// Names of every curve this expression reads.
    pub fn curve_refs(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.visit(&mut |e| {
            if let Expr::Curve(name) = e {
                out.insert(name.clone());
            }
        });
        out
    }

    /// Names of every field variable this expression reads.
    pub fn variable_refs(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.visit(&mut |e| {
            if let Expr::Coord { variable, .. } = e {
                out.insert(variable.clone());
            }
        });
        out
    }

    fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Num(_) | Expr::Time | Expr::Coord { .. } | Expr::Curve(_) => {}
            Expr::Sin(inner) => inner.visit(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::Sum(terms) => {
                for term in terms {
                    term.visit(f);
                }
            }
        }
    }

    /// Numeric value under `env`; `None` if a coordinate or curve is unbound.
    pub fn evaluate(&self, env: &EvalEnv) -> Option<f64> {
        match self {
            Expr::Num(v) => Some(*v),
            Expr::Time => Some(env.time),
            Expr::Coord {
                variable,
                component,
            } => env.coords.get(&(variable.clone(), *component)).copied(),
            Expr::Curve(name) => env.curves.get(name).copied(),
            Expr::Sin(inner) => inner.evaluate(env).map(f64::sin),
            Expr::Binary { op, lhs, rhs } => Some(op.apply(lhs.evaluate(env)?, rhs.evaluate(env)?)),
            Expr::Sum(terms) => terms.iter().map(|t| t.evaluate(env)).sum(),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Sum(terms) => match terms.as_slice() {
                [single] => single.precedence(),
                [] => ATOM,
                _ => BinOp::Add.precedence(),
            },
            Expr::Num(v) if *v < 0.0 => BinOp::Add.precedence(),
            _ => ATOM,
        }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        let prec = self.precedence();
        if prec < min_prec {
            write!(f, "(")?;
            self.write(f, 0)?;
            return write!(f, ")");
        }
        match self {
            Expr::Num(v) => write!(f, "{}", v),
            Expr::Time => write!(f, "t"),
            Expr::Coord {
                variable,
                component,
            } => write!(f, "{}.{}", variable, component),
            Expr::Curve(name) => write!(f, "{}", name),
            Expr::Sin(inner) => {
                write!(f, "sin(")?;
                inner.write(f, 0)?;
                write!(f, ")")
            }
            Expr::Binary { op, lhs, rhs } => match op {
                BinOp::Min | BinOp::Max => {
                    write!(f, "{}(", op.symbol())?;
                    lhs.write(f, 0)?;
                    write!(f, ", ")?;
                    rhs.write(f, 0)?;
                    write!(f, ")")
                }
                _ => {
                    let (left, right) = match op {
                        BinOp::Add | BinOp::Mul => (prec, prec),
                        BinOp::Pow => (prec + 1, prec),
                        _ => (prec, prec + 1),
                    };
                    lhs.write(f, left)?;
                    match op {
                        BinOp::Add | BinOp::Sub | BinOp::Ge | BinOp::Lt => {
                            write!(f, " {} ", op.symbol())?
                        }
                        _ => write!(f, "{}", op.symbol())?,
                    }
                    rhs.write(f, right)
                }
            },
            Expr::Sum(terms) => {
                let Some((first, rest)) = terms.split_first() else {
                    return write!(f, "0");
                };
                first.write(f, prec)?;
                for term in rest {
                    write!(f, " + ")?;
                    term.write(f, prec)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, 0)
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Num(v)
    }
}

macro_rules! impl_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl ops::$trait for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
    };
}

impl_op!(Add, add, BinOp::Add);
impl_op!(Sub, sub, BinOp::Sub);
impl_op!(Mul, mul, BinOp::Mul);
impl_op!(Div, div, BinOp::Div);
