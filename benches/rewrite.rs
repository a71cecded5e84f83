//! Mixin transform benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mixology::common::sourcemap::SourceMap;
use mixology::core::config::RewriteConfig;
use mixology::core::expr::RcExpr;
use mixology::core::publish::Discard;
use mixology::core::transform::transform;
use mixology::import::json::read_json;

const MODULE: &str = r#"
["module", ["const", null, "Publishable"],
 ["begin",
  ["send", null, "extend", ["const", ["const", null, "ActiveSupport"], "Concern"]],
  ["block", ["send", null, "included"], ["args"],
   ["begin",
    ["send", null, "belongs_to", ["sym", "author"]],
    ["send", null, "has_many", ["sym", "comments"]],
    ["send", null, "enum", ["sym", "status"], ["array", ["sym", "draft"], ["sym", "published"]]]]],
  ["send", null, "attr_accessor", ["sym", "reviewer"]],
  ["def", "publish!", ["args", ["arg", "at"]],
   ["block", ["send", null, "transaction"], ["args"],
    ["begin",
     ["send", ["self"], "published_at=", ["lvar", "at"]],
     ["send", null, "published!"],
     ["csend", ["send", null, "draft_copy"], "destroy"]]]],
  ["def", "summary", ["args"],
   ["if", ["send", ["send", null, "author"], "present?"],
    ["dstr", ["send", null, "title"], ["str", " by "], ["send", ["send", null, "author"], "name"]],
    ["send", null, "title"]]],
  ["def", "title", ["args"], ["zsuper"]],
  ["def", "tally", ["args"],
   ["block", ["send", ["send", null, "comments"], "each"], ["args", ["arg", "c"]],
    ["op_asgn", ["ivasgn", "@count"], "+", ["send", ["lvar", "c"], "weight"]]]]]]
"#;

fn module() -> RcExpr {
    read_json(&mut SourceMap::new(), 0, MODULE).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let tree = module();
    let config = RewriteConfig::default();
    c.bench_function("mixin transform", |b| {
        b.iter(|| transform(black_box(&tree), &config, &mut Discard))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
