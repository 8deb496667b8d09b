use covgate::exclude::ExclusionSet;
use covgate::parsers::Parser;

#[test]
fn parse_and_aggregate() {
    let lcov = b"TN:test\nSF:/src/main.js\nDA:1,5\nDA:2,5\nDA:3,0\nLF:3\nLH:2\nend_of_record\n";
    let records = covgate::parsers::lcov::LcovParser.parse(lcov).unwrap();

    let agg = covgate::aggregate::aggregate(&records, &ExclusionSet::default());
    assert_eq!(agg.result.total_found, 3);
    assert_eq!(agg.result.total_hit, 2);
    assert_eq!(agg.uncovered.get("/src/main.js"), Some(&[3][..]));
}

#[test]
fn fixture_with_exclusions() {
    let input = include_bytes!("fixtures/sample.lcov");
    let records = covgate::parsers::lcov::parse(input).unwrap();

    let exclusions = ExclusionSet::parse("src/util.js").unwrap();
    let agg = covgate::aggregate::aggregate(&records, &exclusions);
    assert_eq!(agg.result.total_found, 5);
    assert_eq!(agg.result.total_hit, 3);
    assert_eq!(agg.result.percentage(), Some(60.0));
    assert_eq!(agg.uncovered.get("src/lib.js"), Some(&[3, 5][..]));

    let all = covgate::aggregate::aggregate(&records, &ExclusionSet::default());
    assert_eq!(all.result.total_found, 7);
    assert_eq!(all.result.total_hit, 5);
}
