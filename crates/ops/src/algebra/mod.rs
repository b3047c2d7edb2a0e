//! Raster algebra
//!
//! Evaluates arithmetic expressions over a list of rasters. Expressions
//! reference inputs as `raster1`, `raster2`, ... (band 0 of each) and
//! support `+ - * / % **`, comparisons (`< <= > >= == !=`, yielding 0/1),
//! mask combinators (`& | ^ ~`, nonzero is true), unary minus, and
//! `min(...)`/`max(...)` calls. The expression is parsed into an AST and
//! evaluated cell by cell; no dynamic code execution is involved.
//!
//! Inputs are aligned onto a common grid first. Cells that are nodata in
//! an input are substituted with 0.0 before evaluation, so the expression
//! always sees finite numbers.

mod parser;

use ndarray::Array2;
use terrakit_core::raster::Raster;
use terrakit_core::{Error, Result};

use crate::align::align_rasters;
use crate::maybe_rayon::*;
use parser::{max_var, parse, BinaryOp, Expr, Func, UnaryOp};

fn truthy(v: f64) -> bool {
    v != 0.0
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn eval_cell(expr: &Expr, inputs: &[Array2<f64>], row: usize, col: usize) -> f64 {
    match expr {
        Expr::Number(n) => *n,
        Expr::Var(i) => inputs[*i][[row, col]],
        Expr::Unary(op, operand) => {
            let v = eval_cell(operand, inputs, row, col);
            match op {
                UnaryOp::Neg => -v,
                UnaryOp::Not => bool_to_f64(!truthy(v)),
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let a = eval_cell(lhs, inputs, row, col);
            let b = eval_cell(rhs, inputs, row, col);
            match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                BinaryOp::Pow => a.powf(b),
                BinaryOp::Lt => bool_to_f64(a < b),
                BinaryOp::Le => bool_to_f64(a <= b),
                BinaryOp::Gt => bool_to_f64(a > b),
                BinaryOp::Ge => bool_to_f64(a >= b),
                BinaryOp::Eq => bool_to_f64(a == b),
                BinaryOp::Ne => bool_to_f64(a != b),
                BinaryOp::And => bool_to_f64(truthy(a) && truthy(b)),
                BinaryOp::Or => bool_to_f64(truthy(a) || truthy(b)),
                BinaryOp::Xor => bool_to_f64(truthy(a) != truthy(b)),
            }
        }
        Expr::Call(func, args) => {
            let mut values = args.iter().map(|arg| eval_cell(arg, inputs, row, col));
            // args.len() >= 2 is enforced by the parser
            let first = values.next().unwrap_or(f64::NAN);
            match func {
                Func::Min => values.fold(first, f64::min),
                Func::Max => values.fold(first, f64::max),
            }
        }
    }
}

/// Evaluate an algebra expression over band 0 of each input raster.
///
/// The inputs are aligned onto the grid of the first raster's cell size
/// over their union extent, nodata cells are zeroed, and the expression
/// runs per cell with rows evaluated in parallel. The output carries the
/// aligned georeferencing and the first raster's CRS, with no nodata
/// sentinel of its own.
pub fn evaluate(expr: &str, rasters: &[&Raster<f64>]) -> Result<Raster<f64>> {
    if rasters.is_empty() {
        return Err(Error::InvalidArguments {
            name: "rasters",
            reason: "at least one raster required".to_string(),
        });
    }

    let ast = parse(expr)?;
    if let Some(highest) = max_var(&ast) {
        if highest >= rasters.len() {
            return Err(Error::Expression(format!(
                "expression references raster{} but only {} rasters were given",
                highest + 1,
                rasters.len()
            )));
        }
    }

    let aligned = align_rasters(rasters)?;
    let (rows, cols) = aligned[0].0.shape();

    // Zero out masked cells up front so the AST never sees a sentinel
    let mut inputs: Vec<Array2<f64>> = Vec::with_capacity(aligned.len());
    for (raster, mask) in &aligned {
        let mut grid = raster.band(0)?.data().clone();
        for ((row, col), cell) in grid.indexed_iter_mut() {
            if !mask.is_valid(row, col) {
                *cell = 0.0;
            }
        }
        inputs.push(grid);
    }

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| eval_cell(&ast, &inputs, row, col))
                .collect::<Vec<f64>>()
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(*aligned[0].0.transform());
    output.set_crs(rasters[0].crs().cloned());
    Ok(output)
}
