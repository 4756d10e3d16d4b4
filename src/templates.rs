use actix_web::{http::header, HttpResponse, HttpResponseBuilder};
use askama::Template;

pub fn render<T: Template>(template: T) -> HttpResponse {
    render_into(HttpResponse::Ok(), template)
}

/// Like [`render`], for pages showing admin data that must not be cached.
pub fn render_private<T: Template>(template: T) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.insert_header((header::CACHE_CONTROL, "no-store"));
    render_into(builder, template)
}

fn render_into<T: Template>(mut builder: HttpResponseBuilder, template: T) -> HttpResponse {
    match template.render() {
        Ok(body) => builder.content_type("text/html; charset=utf-8").body(body),
        Err(err) => {
            log::error!("Template render error: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
