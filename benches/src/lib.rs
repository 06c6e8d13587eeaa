pub mod context;

/// A page template exercising loops, conditionals, includes and
/// interpolation.
pub const PAGE: &str = "\
<html>
  <head>
    <title>#{title}</title>
  </head>
  <body>
    = include 'header'
    <table>
    - for user in users
      - unless user.is_disabled
        = include 'row'
      - else
        <tr><td>disabled</td></tr>
    </table>
    - users.each_with_index do |user, i|
      - if i % 2 == 0
        #{i}: #{user.name.upper()}
  </body>
</html>
";

/// Templates made available through the engine's loader.
pub const INCLUDES: &[(&str, &str)] = &[
    ("header", "<h1>#{title}</h1>\n<p>#{users.len()} users</p>"),
    ("row", "<tr>\n  <td>#{user.name}</td>\n  <td>#{user.age}</td>\n</tr>"),
];

/// Returns an engine loading [`INCLUDES`] from memory.
pub fn engine() -> nonhaml::Engine<'static> {
    let mut loader = nonhaml::MemoryLoader::new();
    for (name, source) in INCLUDES {
        loader.insert(*name, *source);
    }
    let mut engine = nonhaml::Engine::new();
    engine.set_loader(loader);
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_renders() {
        let engine = engine();
        let ctx = context::random(4);
        let result = engine.compile(PAGE).unwrap().render(&ctx).unwrap();
        assert!(result.starts_with("<html>\n  <head>\n"));
        assert!(result.contains(&format!("<h1>{}</h1>", ctx.title)));
    }
}
