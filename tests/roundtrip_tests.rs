use erdsketch::ast::{Position, TablePosition};
use erdsketch::meta::{ColorSetting, Directive};
use erdsketch::parser::parse;
use erdsketch::serializer::{format, serialize};

const SAMPLES: &[&str] = &[
    "",
    "user\n----\nid pk\nusername varchar(64)\n",
    r#"
# a leading note
user
----
id pk
username varchar(64) unique


post
----
id pk
author_id fk >- user.id
content text
status enum('active', 'pending') default 'active'


reply
-----
id pk
post_id fk # e.g. post_id references to post.id
user_id fk
reply_id null fk # it's fine to include other modifiers in the middle
content text

# view: (-12, 30)
# zoom: 1.250
# user (10, 20, #c0ffee)
# post (200, 20)
# text-bg: #1e1e1e
# table-text: #f0f0f0
"#,
    "orphan int\n  shop \r\n--\r\n id   pk\r\n\tname\ttext  null unique\n----\nstray\n",
    "a\n-\nb_id fk -< b\nc fk >-< c.key\nd -0 d\n\nb\n-\n\nc\n-\nkey unsigned pk\n# c (1, 1)\n# ghost (5, 5)\n",
    "ユーザー\n--\n名前 文字列 # 表示名\n",
    "user\n----\nid\n----\nname\n",
    "t\n-\nprice decimal(10, 2) default 0.00 # money\nnote double precision null\n",
    "- users\n-------\nid pk\n",
    "x\n-\n- default\nid\n# x (1, 2, #ABCDEF)\n",
    "# zoom: 1000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000\n",
];

#[test]
fn format_is_idempotent() {
    for sample in SAMPLES {
        let once = format(sample);
        let twice = format(&once);
        assert_eq!(once, twice, "input: {sample:?}");
    }
}

#[test]
fn reparse_of_formatted_text_is_unchanged() {
    for sample in SAMPLES {
        let parsed = parse(sample);
        assert_eq!(parse(&serialize(&parsed)), parsed, "input: {sample:?}");
    }
}

#[test]
fn canonical_text_is_a_fixed_point() {
    let canonical = "user\n----\nid pk\nname text null\n\npost\n----\nid pk\nuser_id fk\n\n# zoom: 1.000\n# user (0, 0)\n";
    assert_eq!(format(canonical), canonical);
}

#[test]
fn table_and_field_order_follow_source() {
    let result = parse("zeta\n----\nb\na\n\nalpha\n-----\nz\ny\n\nmid\n---\nm\n");
    let tables: Vec<&str> = result.table_list.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tables, vec!["zeta", "alpha", "mid"]);

    let fields: Vec<&str> = result.table_list[0]
        .field_list
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(fields, vec!["b", "a"]);
}

#[test]
fn duplicate_table_names_are_kept() {
    let result = parse("user\n----\nid\n\nuser\n----\nname\n");
    assert_eq!(result.table_list.len(), 2);
    assert_eq!(result.table("user").unwrap().field_list[0].name, "id");
}

#[test]
fn every_directive_round_trips() {
    let values = vec![
        Directive::Zoom(0.75),
        Directive::Zoom(3.0),
        Directive::View(Position { x: 0, y: 0 }),
        Directive::View(Position { x: -640, y: 480 }),
        Directive::TablePosition {
            name: "order_item".into(),
            position: TablePosition { x: -1, y: 99999, color: None },
        },
        Directive::TablePosition {
            name: "user".into(),
            position: TablePosition {
                x: 5,
                y: 6,
                color: Some("#0a0b0c".into()),
            },
        },
        Directive::TablePosition {
            name: "user".into(),
            position: TablePosition {
                x: 0,
                y: 0,
                color: Some("#C0FFEE".into()),
            },
        },
        Directive::Color {
            setting: ColorSetting::DiagramBg,
            color: "#ffffff".into(),
        },
    ];
    for value in values {
        value.check().unwrap();
        assert_eq!(Directive::parse_line(&value.to_line()), Some(value));
    }
}

#[test]
fn directives_survive_formatting() {
    let input = "# table-bg: #101010\nuser\n----\nid\n# zoom: 0.800\n# user (3, 4)\n";
    let result = parse(&format(input));
    assert_eq!(result.zoom, Some(0.8));
    assert_eq!(result.table_bg_color.as_deref(), Some("#101010"));
    assert_eq!(
        result.table_positions.get("user"),
        Some(&TablePosition { x: 3, y: 4, color: None })
    );
}
