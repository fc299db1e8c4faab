use sprig_parser::{Assoc, Decision, Element, GrammarBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let parser = GrammarBuilder::new()
        .token("val", r"\d+")
        .rule("expr", [Element::tag("val")], |args| {
            args.text(0)
                .and_then(|text| text.parse::<usize>().ok())
                .unwrap_or_default()
        })
        .rule(
            "expr",
            [
                Element::keyword("("),
                Element::tag("expr"),
                Element::keyword(")"),
            ],
            |args| args.value(1).unwrap_or_default(),
        )
        .with_error_handler(|ctx| match ctx.dot() {
            // unclosed parentheses
            2 if ctx.is_eof() => Decision::PerformBefore(ctx.keyword(")")),
            // unreadable characters inside parentheses
            2 if ctx.token().kind.is_none() => Decision::Skip,
            _ => Decision::NextHandler,
        })
        .binary("expr", "+", 1, Assoc::Left, |args| {
            args.value(0).unwrap_or_default() + args.value(2).unwrap_or_default()
        })
        .binary("expr", "*", 2, Assoc::Left, |args| {
            args.value(0).unwrap_or_default() * args.value(2).unwrap_or_default()
        })
        .start("expr")
        .build()?;

    println!("{:#?}", parser.grammar());

    for input in ["3+4*2", "(3+4)*2", "(3_+4)*2", "((3+4)", "3+4_"] {
        match parser.parse(input) {
            Ok(value) => println!("{} = {}", input, value),
            Err(error) => println!("{}: {}", input, error),
        }
    }

    Ok(())
}
