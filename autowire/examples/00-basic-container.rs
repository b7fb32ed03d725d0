use autowire::config::ContainerConfig;
use autowire::container::ContainerBuilder;
use autowire_di::component::ComponentType;
use autowire_di::instance_provider::ComponentInstancePtr;
use autowire_di::{component_alias, injectable, Component};

// components are declared by deriving Component - each field is a dependency, which gets
// registered automatically if needed
#[derive(Component)]
struct ComponentA;

impl ComponentA {
    fn do_something(&self) {
        println!("ComponentA: do_something()");
    }
}

#[injectable]
trait Greeter {
    fn greet(&self) -> String;
}

#[derive(Component)]
struct ComponentB;

// ComponentB can now be injected as dyn Greeter
#[component_alias]
impl Greeter for ComponentB {
    fn greet(&self) -> String {
        "Hello from ComponentB".to_string()
    }
}

#[allow(dead_code)]
struct ComponentC {
    component_b: ComponentInstancePtr<ComponentB>,
}

// explicit constructors and post-construction hooks are declared on the impl block
#[autowire_di::component]
impl ComponentC {
    #[autowired]
    fn new(component_b: ComponentInstancePtr<ComponentB>) -> Self {
        Self { component_b }
    }

    #[post_construct]
    fn init(&self) {
        println!("ComponentC: initialized");
    }
}

#[derive(Component)]
struct ComponentD {
    // the qualifier selects a registered component by its type name
    #[component(qualifier = "ComponentB")]
    greeter: ComponentInstancePtr<dyn Greeter + Send + Sync>,
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let container = ContainerBuilder::new()
        .with_config(ContainerConfig::default())
        .with_pre_add_listener(|component_type: &ComponentType| {
            println!("Adding component: {}", component_type.simple_name)
        })
        .with_post_add_listener(|component_type: &ComponentType| {
            println!("Component added: {}", component_type.simple_name)
        })
        .build()
        .expect("unable to create container");

    container
        .register_component::<ComponentA>()
        .expect("unable to register ComponentA");
    container
        .register_component::<ComponentB>()
        .expect("unable to register ComponentB");
    container
        .register_component::<ComponentC>()
        .expect("unable to register ComponentC");
    container
        .register_component::<ComponentD>()
        .expect("unable to register ComponentD");

    let component_a = container
        .get_bean::<ComponentA>()
        .expect("unable to get ComponentA");
    component_a.do_something();

    let component_d = container
        .get_bean::<ComponentD>()
        .expect("unable to get ComponentD");
    println!("{}", component_d.greeter.greet());
}
