use crate::entities::inventory::Possesses;
use crate::world::object_spec::Attributes;

/// Values a `${...}` placeholder may resolve against.
pub struct TemplateContext<'a> {
    pub player_name: &'a str,
    pub label: &'a str,
    pub attributes: &'a Attributes,
    pub possesses: &'a dyn Possesses,
}

/// Interpolates `${key}` and `${possesses:kind:id}` placeholders. `$$` is a
/// literal `$`; placeholders that resolve to nothing are kept verbatim.
pub fn render(template: &str, context: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }
        if let Some(body) = after.strip_prefix('{') {
            if let Some(end) = body.find('}') {
                let key = &body[..end];
                match resolve(key, context) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &body[end + 1..];
                continue;
            }
        }
        out.push('$');
        rest = after;
    }
    out.push_str(rest);
    out
}

fn resolve(key: &str, context: &TemplateContext<'_>) -> Option<String> {
    let key = key.trim();
    if let Some(query) = key.strip_prefix("possesses:") {
        let (kind, identifier) = query.split_once(':')?;
        let owned = context.possesses.possesses(kind.trim(), identifier.trim());
        return Some(if owned { "yes" } else { "no" }.to_string());
    }
    match key {
        "playerName" | "player" => Some(context.player_name.to_string()),
        "label" => Some(context.label.to_string()),
        _ => context.attributes.get(key).map(str::to_string),
    }
}
