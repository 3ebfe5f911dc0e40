//! Text front end producing [`Statement`] trees.
//!
//! WHERE conditions are read in conjunctive normal form: `AND` separates
//! clauses and `OR` joins the predicates of one clause, so
//! `a = 1 OR a = 2 AND b = 'x'` means `(a = 1 OR a = 2) AND b = 'x'`.
//! Parentheses around a clause are accepted but never required.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_opt, map_res, not, opt, recognize, value, verify},
    error::Error,
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated},
};

use crate::error::{DbError, DbResult};
use crate::sql::ast::{Clause, Cnf, CompareOp, Literal, Operand, Predicate, SortKey, Statement};
use crate::storage::row::ColumnType;

type Res<'a, T> = IResult<&'a str, T>;

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

/// Case-insensitive keyword that is not the prefix of a longer word.
fn kw<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = Error<&'a str>> {
    ws(terminated(tag_no_case(word), not(satisfy(is_ident_char))))
}

fn symbol<'a>(c: char) -> impl Parser<&'a str, Output = char, Error = Error<&'a str>> {
    ws(char(c))
}

fn identifier(input: &str) -> Res<'_, &str> {
    ws(verify(take_while1(is_ident_char), |s: &str| {
        !s.starts_with(|c: char| c.is_ascii_digit())
    }))
    .parse(input)
}

fn name(input: &str) -> Res<'_, String> {
    map(identifier, |s: &str| s.to_string()).parse(input)
}

fn float_literal(input: &str) -> Res<'_, Literal> {
    map_res(
        recognize((opt(char('-')), digit1, char('.'), digit1)),
        |s: &str| s.parse::<f64>().map(Literal::Float),
    )
    .parse(input)
}

fn integer_literal(input: &str) -> Res<'_, Literal> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i32>().map(Literal::Integer)
    })
    .parse(input)
}

fn string_literal(input: &str) -> Res<'_, Literal> {
    map(
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        |s: &str| Literal::Text(s.to_string()),
    )
    .parse(input)
}

fn literal(input: &str) -> Res<'_, Literal> {
    ws(alt((float_literal, integer_literal, string_literal))).parse(input)
}

fn operand(input: &str) -> Res<'_, Operand> {
    alt((map(literal, Operand::Literal), map(name, Operand::Column))).parse(input)
}

fn compare_op(input: &str) -> Res<'_, CompareOp> {
    ws(alt((
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Ne, tag("<>")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Eq, tag("=")),
        value(CompareOp::Lt, tag("<")),
        value(CompareOp::Gt, tag(">")),
    )))
    .parse(input)
}

fn predicate(input: &str) -> Res<'_, Predicate> {
    map((operand, compare_op, operand), |(left, op, right)| Predicate::new(op, left, right))
        .parse(input)
}

fn clause(input: &str) -> Res<'_, Clause> {
    alt((
        delimited(symbol('('), separated_list1(kw("OR"), predicate), symbol(')')),
        separated_list1(kw("OR"), predicate),
    ))
    .parse(input)
}

fn where_clause(input: &str) -> Res<'_, Cnf> {
    map(opt(preceded(kw("WHERE"), separated_list1(kw("AND"), clause))), |c| {
        c.unwrap_or_default()
    })
    .parse(input)
}

fn column_type(input: &str) -> Res<'_, ColumnType> {
    map_opt(identifier, ColumnType::from_name).parse(input)
}

fn create_table(input: &str) -> Res<'_, Statement> {
    map(
        (
            kw("CREATE"),
            kw("TABLE"),
            name,
            delimited(symbol('('), separated_list1(symbol(','), (name, column_type)), symbol(')')),
        ),
        |(_, _, table_name, columns)| Statement::CreateTable { table_name, columns },
    )
    .parse(input)
}

fn drop_table(input: &str) -> Res<'_, Statement> {
    map((kw("DROP"), kw("TABLE"), name), |(_, _, table_name)| Statement::DropTable {
        table_name,
    })
    .parse(input)
}

fn create_index(input: &str) -> Res<'_, Statement> {
    map(
        (
            kw("CREATE"),
            kw("INDEX"),
            name,
            kw("ON"),
            name,
            delimited(symbol('('), name, symbol(')')),
        ),
        |(_, _, index_name, _, table_name, column_name)| Statement::CreateIndex {
            index_name,
            table_name,
            column_name,
        },
    )
    .parse(input)
}

fn drop_index(input: &str) -> Res<'_, Statement> {
    map((kw("DROP"), kw("INDEX"), name), |(_, _, index_name)| Statement::DropIndex {
        index_name,
    })
    .parse(input)
}

fn insert(input: &str) -> Res<'_, Statement> {
    map(
        (
            kw("INSERT"),
            kw("INTO"),
            name,
            kw("VALUES"),
            delimited(symbol('('), separated_list1(symbol(','), literal), symbol(')')),
        ),
        |(_, _, table_name, _, values)| Statement::Insert { table_name, values },
    )
    .parse(input)
}

fn delete(input: &str) -> Res<'_, Statement> {
    map(
        (kw("DELETE"), kw("FROM"), name, where_clause),
        |(_, _, table_name, predicates)| Statement::Delete { table_name, predicates },
    )
    .parse(input)
}

fn update(input: &str) -> Res<'_, Statement> {
    map(
        (
            kw("UPDATE"),
            name,
            kw("SET"),
            separated_list1(symbol(','), (name, symbol('='), literal)),
            where_clause,
        ),
        |(_, table_name, _, assignments, predicates)| {
            let (columns, values) = assignments.into_iter().map(|(c, _, v)| (c, v)).unzip();
            Statement::Update { table_name, columns, values, predicates }
        },
    )
    .parse(input)
}

fn projection(input: &str) -> Res<'_, Vec<String>> {
    alt((value(Vec::new(), symbol('*')), separated_list1(symbol(','), name))).parse(input)
}

fn sort_key(input: &str) -> Res<'_, SortKey> {
    map(
        (name, opt(alt((value(false, kw("ASC")), value(true, kw("DESC")))))),
        |(column, desc)| SortKey { column, descending: desc.unwrap_or(false) },
    )
    .parse(input)
}

fn order_by(input: &str) -> Res<'_, Vec<SortKey>> {
    map(
        opt(preceded((kw("ORDER"), kw("BY")), separated_list1(symbol(','), sort_key))),
        |keys| keys.unwrap_or_default(),
    )
    .parse(input)
}

fn select(input: &str) -> Res<'_, Statement> {
    map(
        (
            kw("SELECT"),
            projection,
            kw("FROM"),
            separated_list1(symbol(','), name),
            where_clause,
            order_by,
        ),
        |(_, columns, _, tables, predicates, order_by)| Statement::Select {
            columns,
            tables,
            predicates,
            order_by,
        },
    )
    .parse(input)
}

fn statement(input: &str) -> Res<'_, Statement> {
    alt((create_table, create_index, drop_table, drop_index, insert, delete, update, select))
        .parse(input)
}

pub fn parse_statement(input: &str) -> DbResult<Statement> {
    all_consuming(terminated(statement, opt(symbol(';'))))
        .parse(input)
        .map(|(_, stmt)| stmt)
        .map_err(|e| DbError::ParseError(e.to_string()))
}
