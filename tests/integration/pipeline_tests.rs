use crate::test_config;
use carrier_scout::{PageFetcher, PageOutcome, Pipeline, SourceId};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!("<html><body>{}</body></html>", body))
}

fn pipeline(server: &MockServer, source: SourceId) -> Pipeline {
    let config = test_config(&server.uri());
    let fetcher = PageFetcher::new(&config.http).unwrap();
    Pipeline::new(source.build(fetcher, &config).unwrap())
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_total_pages_takes_highest_index() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/rotas/pagina-1",
        r#"
        <a href="/rotas/pagina-1">1</a>
        <a href="/rotas/pagina-2">2</a>
        <a href="/rotas/pagina-3">3</a>
        <a href="/rotas/pagina-7">7</a>
        "#,
    )
    .await;

    assert_eq!(
        pipeline(&server, SourceId::PortalDosFretes).total_pages().await,
        7
    );
}

#[tokio::test]
async fn test_total_pages_without_pagination_is_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rotas"))
        .and(query_param("page", "1"))
        .respond_with(html("<p>Sem paginação</p>"))
        .mount(&server)
        .await;

    assert_eq!(pipeline(&server, SourceId::Cargas).total_pages().await, 1);
}

#[tokio::test]
async fn test_total_pages_unreachable_is_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert_eq!(
        pipeline(&server, SourceId::GuiaDoTransporte)
            .total_pages()
            .await,
        0
    );
}

#[tokio::test]
async fn test_empty_listing_yields_message() {
    let server = MockServer::start().await;
    mount_page(&server, "/rotas/pagina-9", "<p>Nada por aqui</p>").await;

    let outcome = pipeline(&server, SourceId::PortalDosFretes)
        .run_page(9)
        .await;

    assert_eq!(
        outcome,
        PageOutcome::NoRoutes {
            message: "Nenhuma rota encontrada na página 9".to_string()
        }
    );
}

#[tokio::test]
async fn test_portal_merges_company_across_routes() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/rotas/pagina-1",
        r#"
        <a href="/fretes/frete-de-sao-paulo-para-rio-de-janeiro">Fretes de São Paulo para Rio de Janeiro</a>
        <a href="/fretes/frete-de-sao-paulo-para-curitiba">Frete de São Paulo para Curitiba</a>
        <a href="/sobre">Sobre nós</a>
        "#,
    )
    .await;

    let listing = r#"<div data-nome="ABC"><a href="/transportadora/abc">ABC Transportes</a></div>"#;
    mount_page(
        &server,
        "/fretes/frete-de-sao-paulo-para-rio-de-janeiro",
        listing,
    )
    .await;
    mount_page(&server, "/fretes/frete-de-sao-paulo-para-curitiba", listing).await;

    Mock::given(method("GET"))
        .and(path("/transportadora/abc"))
        .respond_with(html(
            r#"
            <h1>ABC Transportes Ltda</h1>
            <a href="tel:1133334444">Telefone: (11) 3333-4444</a>
            <p>CNPJ: 12.345.678/0001-90</p>
            <p>Número da ANTT: 0045123</p>
            "#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = pipeline(&server, SourceId::PortalDosFretes)
        .run_page(1)
        .await;
    let companies = outcome.companies().unwrap();

    assert_eq!(companies.len(), 1);
    let company = &companies[0];
    assert_eq!(company.name, "ABC Transportes Ltda");
    assert_eq!(company.routes.origins, vec!["Sao Paulo"]);
    assert_eq!(
        company.routes.destinations,
        vec!["Curitiba", "Rio De Janeiro"]
    );
    assert_eq!(company.details.telephone.as_deref(), Some("(11) 3333-4444"));
    assert_eq!(company.details.tax_id.as_deref(), Some("12.345.678/0001-90"));
    assert_eq!(company.details.additional_id.as_deref(), Some("0045123"));
}

#[tokio::test]
async fn test_cargas_keeps_company_when_details_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rotas"))
        .and(query_param("page", "2"))
        .respond_with(html(
            r#"<a href="/transportadoras/sao-paulo/recife">São Paulo → Recife</a>"#,
        ))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/transportadoras/sao-paulo/recife",
        r#"
        <a href="/transportadoras/sao-paulo/natal">Outra rota</a>
        <a href="/transportadora/norte-cargas">Norte Cargas</a>
        "#,
    )
    .await;

    // Every attempt fails, so the fetcher spends all of its retries
    Mock::given(method("GET"))
        .and(path("/transportadora/norte-cargas"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let outcome = pipeline(&server, SourceId::Cargas).run_page(2).await;
    let companies = outcome.companies().unwrap();

    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].name, "Norte Cargas");
    assert_eq!(companies[0].routes.origins, vec!["Sao Paulo"]);
    assert_eq!(companies[0].routes.destinations, vec!["Recife"]);
    assert!(companies[0].details.is_empty());
}

#[tokio::test]
async fn test_guia_resolves_name_from_detail_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cotacao-transportadora/origem-e-destino"))
        .and(query_param("page", "1"))
        .respond_with(html(
            r#"<div class="grid"><a href="/rotas/sp-ba">De São Paulo para Salvador</a></div>"#,
        ))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/rotas/sp-ba",
        r#"<a href="/transportadora/guia"><h4>Transportes Guia</h4></a>"#,
    )
    .await;
    mount_page(
        &server,
        "/transportadora/guia",
        r#"
        <section><div><div><div>
          <h3>Transportes Guia Ltda</h3>
          <p>Av. Sete de Setembro, 100 - Salvador/BA</p>
        </div></div></div></section>
        <a href="mailto:contato@guia.com.br">E-mail</a>
        <a href="https://wa.me/5571999990000">WhatsApp</a>
        "#,
    )
    .await;

    let outcome = pipeline(&server, SourceId::GuiaDoTransporte)
        .run_page(1)
        .await;
    let companies = outcome.companies().unwrap();

    assert_eq!(companies.len(), 1);
    let company = &companies[0];
    assert_eq!(company.name, "Transportes Guia Ltda");
    assert_eq!(company.routes.origins, vec!["São Paulo"]);
    assert_eq!(company.routes.destinations, vec!["Salvador"]);
    assert_eq!(company.details.email.as_deref(), Some("contato@guia.com.br"));
    assert_eq!(
        company.details.whatsapp.as_deref(),
        Some("https://wa.me/5571999990000")
    );
    assert_eq!(
        company.details.address.as_deref(),
        Some("Av. Sete de Setembro, 100 - Salvador/BA")
    );
}

#[tokio::test]
async fn test_unknown_source_id() {
    let err = SourceId::from_id(42).unwrap_err();
    assert!(err.to_string().contains("1, 2, 3"));
}
