use normdb_core::{config::NormalizeConfig, normal_form::NormalForm};
use normdb_schema::{JsonSource, SchemaError, SchemaSource, TextSource};
use std::{fs, path::PathBuf};

const EMP_PROJ: &str = "\
# employee / project assignment
emp_proj
SSN,PNumber,Hours,EName,PName,PLocation
SSN,PNumber->Hours
SSN->EName
PNumber->PName,PLocation
";

fn scratch(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("normdb-schema-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();

    path
}

#[test]
fn text_schema_normalizes_to_second_normal_form() {
    let mut db = TextSource::new(EMP_PROJ)
        .load(NormalizeConfig::default())
        .unwrap();

    db.normalize(NormalForm::Second, 1).unwrap();

    let names: Vec<_> = db.relations().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["global_relation", "r1", "r2"]);

    let catalog = db.catalog();
    let global = db.relations().find("global_relation").unwrap();
    assert_eq!(catalog.names(&global.attributes), vec!["SSN", "PNumber", "Hours"]);
    let r1 = db.relations().find("r1").unwrap();
    assert_eq!(catalog.names(&r1.attributes), vec!["SSN", "EName"]);
    let r2 = db.relations().find("r2").unwrap();
    assert_eq!(catalog.names(&r2.attributes), vec!["PNumber", "PName", "PLocation"]);
}

#[test]
fn text_and_json_sources_agree() {
    let json = r#"{
        "name": "emp_proj",
        "attributes": ["SSN", "PNumber", "Hours", "EName", "PName", "PLocation"],
        "dependencies": [
            { "lhs": ["SSN", "PNumber"], "rhs": ["Hours"] },
            { "lhs": ["SSN"], "rhs": ["EName"] },
            { "lhs": ["PNumber"], "rhs": ["PName", "PLocation"] }
        ]
    }"#;

    assert_eq!(
        TextSource::new(EMP_PROJ).read_schema().unwrap(),
        JsonSource::new(json).read_schema().unwrap()
    );
}

#[test]
fn open_picks_source_by_extension() {
    let text = scratch("emp.txt", EMP_PROJ);
    let json = scratch("emp.json", r#"{ "name": "j", "attributes": ["A", "B"] }"#);

    assert_eq!(normdb_schema::open(&text).unwrap().read_schema().unwrap().name, "emp_proj");
    assert_eq!(normdb_schema::open(&json).unwrap().read_schema().unwrap().name, "j");
}

#[test]
fn missing_file_is_io_error() {
    let err = TextSource::from_path("/definitely/not/here.txt").unwrap_err();

    assert!(matches!(err, SchemaError::Io { .. }));
}

#[test]
fn undeclared_attribute_fails_load() {
    let err = TextSource::new("db\nA,B\nA->C\n")
        .load(NormalizeConfig::default())
        .unwrap_err();

    assert!(matches!(err, SchemaError::Core(_)));
}
