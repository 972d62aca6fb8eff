use super::*;
use serde_json::json;

fn sorted_keys(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(fields) => {
            for (key, inner) in fields {
                out.push(key.clone());
                sorted_keys(inner, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| sorted_keys(item, out)),
        _ => {}
    }
    out.sort();
}

#[test]
fn converts_single_keys() {
    assert_eq!(snake_to_camel("poster_url"), "posterUrl");
    assert_eq!(snake_to_camel("is_active"), "isActive");
    assert_eq!(snake_to_camel("id"), "id");
    assert_eq!(camel_to_snake("posterUrl"), "poster_url");
    assert_eq!(camel_to_snake("kinopoiskId"), "kinopoisk_id");
    assert_eq!(camel_to_snake("title"), "title");
}

#[test]
fn leaves_unfoldable_underscores_alone() {
    assert_eq!(snake_to_camel("_private"), "Private");
    assert_eq!(snake_to_camel("trailing_"), "trailing_");
    assert_eq!(snake_to_camel("area_51"), "area_51");
}

#[test]
fn rewrites_nested_objects_and_arrays_but_not_values() {
    let input = json!({
        "movie_id": "abc",
        "swipe_type": "like",
        "group_participants": [1, 2],
        "nested_list": [{"poster_url": "p_q"}, "plain_string"],
        "inner_object": {"created_at": null}
    });

    let converted = snake_to_camel_keys(input);

    assert_eq!(
        converted,
        json!({
            "movieId": "abc",
            "swipeType": "like",
            "groupParticipants": [1, 2],
            "nestedList": [{"posterUrl": "p_q"}, "plain_string"],
            "innerObject": {"createdAt": null}
        })
    );
}

#[test]
fn snake_camel_snake_round_trip_preserves_key_set() {
    let original = json!({
        "id": "b7c1",
        "kinopoisk_id": 326,
        "title_original": "The Shawshank Redemption",
        "poster_url": "https://example.com/p.jpg",
        "created_at": "2025-01-01T00:00:00Z",
        "is_active": true,
        "swipes": [{"swipe_type": "like", "group_participants": []}]
    });

    let round_tripped = camel_to_snake_keys(snake_to_camel_keys(original.clone()));

    let mut expected = Vec::new();
    sorted_keys(&original, &mut expected);
    let mut actual = Vec::new();
    sorted_keys(&round_tripped, &mut actual);
    assert_eq!(actual, expected);
    assert_eq!(round_tripped, original);
}

#[test]
fn primitives_pass_through() {
    assert_eq!(snake_to_camel_keys(json!(42)), json!(42));
    assert_eq!(camel_to_snake_keys(json!("someValue")), json!("someValue"));
    assert_eq!(snake_to_camel_keys(Value::Null), Value::Null);
}
