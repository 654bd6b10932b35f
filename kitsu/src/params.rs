use std::borrow::Cow;

pub(crate) struct JsonFilterKey<'a>(pub &'a str);

impl<'a> From<JsonFilterKey<'a>> for Cow<'a, str> {
    fn from(k: JsonFilterKey<'a>) -> Self {
        format!("filter[{}]", k.0).into()
    }
}

pub(crate) struct PageKey<'a>(pub &'a str);

impl<'a> From<PageKey<'a>> for Cow<'a, str> {
    fn from(k: PageKey<'a>) -> Self {
        format!("page[{}]", k.0).into()
    }
}
