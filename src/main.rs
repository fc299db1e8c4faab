use sprig::{Assoc, Decision, Element, Engine, Fix, GrammarBuilder};
use std::io::Read;

fn number(args: &mut sprig::Args<f64>, index: usize) -> f64 {
    args.value(index).unwrap_or(f64::NAN)
}

fn calculator() -> GrammarBuilder<f64> {
    GrammarBuilder::new()
        .token("num", r"[0-9]+(\.[0-9]+)?")
        .discard(r"\s+")
        .rule("expr", [Element::tag("num")], |args| {
            args.text(0)
                .and_then(|text| text.parse().ok())
                .unwrap_or(f64::NAN)
        })
        .rule(
            "expr",
            [
                Element::keyword("("),
                Element::tag("expr"),
                Element::keyword(")"),
            ],
            |args| number(args, 1),
        )
        // close the parentheses left open at the end of the input
        .with_error_handler(|ctx| match ctx.dot() {
            2 if ctx.is_eof() => Decision::PerformBefore(ctx.keyword(")")),
            _ => Decision::Stop,
        })
        .binary("expr", "+", 1, Assoc::Left, |args| {
            number(args, 0) + number(args, 2)
        })
        .binary("expr", "-", 1, Assoc::Left, |args| {
            number(args, 0) - number(args, 2)
        })
        .binary("expr", "*", 2, Assoc::Left, |args| {
            number(args, 0) * number(args, 2)
        })
        .binary("expr", "/", 2, Assoc::Left, |args| {
            number(args, 0) / number(args, 2)
        })
        .unary("expr", "-", 3, Fix::Prefix, |args| -number(args, 1))
        .binary("expr", "^", 4, Assoc::Right, |args| {
            number(args, 0).powf(number(args, 2))
        })
        .start("expr")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let engine = Engine::new(calculator())?;

    let mut input = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if input.is_empty() {
        std::io::stdin().read_to_string(&mut input)?;
    }

    println!("{}", engine.parse(&input)?);

    Ok(())
}
