//! Benchmark for the compilation pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pyrite_lang::analyzer::analyze;
use pyrite_lang::ast::{Argument, BinaryOp, Expr, FunctionDecl, Parameter, Program, Stmt};
use pyrite_lang::compiler::compile;
use pyrite_lang::generator::generate;
use pyrite_lang::optimizer::optimize;

// def add(x, y = 1): return x + y
// r = add(2)
// s = 3 + 4 * 2
fn sample_program() -> Program {
    Program::new(vec![
        Stmt::Function(FunctionDecl::new(
            "add",
            vec![
                Parameter::required("x"),
                Parameter::optional("y", Expr::Number(1.0)),
            ],
            vec![Stmt::Return(Some(Expr::binary(
                BinaryOp::Add,
                Expr::variable("x"),
                Expr::variable("y"),
            )))],
        )),
        Stmt::assign(
            "r",
            Expr::call("add", vec![Argument::positional(Expr::Number(2.0))]),
        ),
        Stmt::assign(
            "s",
            Expr::binary(
                BinaryOp::Add,
                Expr::Number(3.0),
                Expr::binary(BinaryOp::Mul, Expr::Number(4.0), Expr::Number(2.0)),
            ),
        ),
    ])
}

fn benchmark_analyze(c: &mut Criterion) {
    c.bench_function("analyze sample program", |b| {
        b.iter(|| {
            let mut program = sample_program();
            black_box(analyze(&mut program).unwrap())
        });
    });
}

fn benchmark_optimize(c: &mut Criterion) {
    c.bench_function("optimize analyzed program", |b| {
        b.iter(|| {
            let mut program = sample_program();
            analyze(&mut program).unwrap();
            optimize(&mut program);
            black_box(program)
        });
    });
}

fn benchmark_generate(c: &mut Criterion) {
    c.bench_function("generate JavaScript", |b| {
        b.iter(|| {
            let mut program = sample_program();
            let analysis = analyze(&mut program).unwrap();
            black_box(generate(&program, &analysis))
        });
    });
}

fn benchmark_full_pipeline(c: &mut Criterion) {
    c.bench_function("full compile pipeline", |b| {
        b.iter(|| {
            let mut program = sample_program();
            black_box(compile(&mut program).unwrap())
        });
    });
}

criterion_group!(
    benches,
    benchmark_analyze,
    benchmark_optimize,
    benchmark_generate,
    benchmark_full_pipeline
);
criterion_main!(benches);
